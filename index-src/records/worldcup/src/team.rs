use avl_tree::{AvlTree, TreeError};
use itertools::Itertools;

use crate::{
    player::{Player, PlayerId, ScoreKey, TeamId},
    Rules,
};

/// A team and its two player indexes, one by id and one by ranking.
#[derive(Debug)]
pub struct Team {
    id: TeamId,
    points: i32,
    games: i32,
    goals: i32,
    cards: i32,
    goalkeepers: usize,
    players_by_id: AvlTree<PlayerId, ()>,
    players_by_score: AvlTree<ScoreKey, PlayerId>,
}

impl Team {
    pub(crate) fn new(id: TeamId, points: i32) -> Self {
        Self {
            id,
            points,
            games: 0,
            goals: 0,
            cards: 0,
            goalkeepers: 0,
            players_by_id: AvlTree::new(),
            players_by_score: AvlTree::new(),
        }
    }

    pub fn id(&self) -> TeamId { self.id }
    pub fn points(&self) -> i32 { self.points }
    pub fn games(&self) -> i32 { self.games }
    pub fn goals(&self) -> i32 { self.goals }
    pub fn cards(&self) -> i32 { self.cards }
    pub fn goalkeepers(&self) -> usize { self.goalkeepers }
    pub fn len(&self) -> usize { self.players_by_id.len() }
    pub fn is_empty(&self) -> bool { self.players_by_id.is_empty() }

    /// Strength used to decide matches.
    pub fn match_score(&self) -> i32 { self.points + self.goals - self.cards }

    pub fn is_valid(&self, rules: &Rules) -> bool {
        self.len() >= rules.min_players && self.goalkeepers > 0
    }

    pub fn top_scorer(&self) -> Option<PlayerId> {
        let key = self.players_by_score.max()?;
        Some(key.id)
    }

    /// Player ids from the lowest to the highest ranked.
    pub fn ranked_ids(&self) -> Vec<PlayerId> { self.ranked().collect() }

    pub(crate) fn ranked(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players_by_score.iter().map(|(_, &id)| id)
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.players_by_id.contains_key(&player)
    }

    pub(crate) fn record_match(&mut self, points: i32) {
        self.points += points;
        self.games += 1;
    }

    /// Adds `player` to both indexes, or to neither.
    pub(crate) fn insert_player(
        &mut self,
        player: &Player,
    ) -> Result<(), TreeError> {
        self.players_by_id.insert(player.id, ())?;
        let key = player.score_key();
        if let Err(e) = self.players_by_score.insert(key, player.id) {
            let undone = self.players_by_id.remove(&player.id);
            debug_assert!(undone.is_ok());
            return Err(e);
        }
        self.goals += player.goals;
        self.cards += player.cards;
        self.goalkeepers += usize::from(player.goalkeeper);
        Ok(())
    }

    pub(crate) fn remove_player(&mut self, player: &Player) {
        let by_id = self.players_by_id.remove(&player.id);
        let by_score = self.players_by_score.remove(&player.score_key());
        debug_assert!(by_id.is_ok() && by_score.is_ok());
        self.goals -= player.goals;
        self.cards -= player.cards;
        self.goalkeepers -= usize::from(player.goalkeeper);
    }

    /// First half of a ranking change: indexes the new key next to the old
    /// one. This is the only step that can fail, and it leaves the index
    /// unchanged when it does.
    pub(crate) fn rekey_insert(
        &mut self,
        new: ScoreKey,
    ) -> Result<(), TreeError> {
        self.players_by_score.insert(new, new.id).map(drop)
    }

    /// Second half: drops the old key and accounts for the new totals.
    pub(crate) fn rekey_finish(
        &mut self,
        old: ScoreKey,
        goals: i32,
        cards: i32,
    ) {
        let removed = self.players_by_score.remove(&old);
        debug_assert!(removed.is_ok());
        self.goals += goals;
        self.cards += cards;
    }

    /// A new team holding the players of both `a` and `b`.
    ///
    /// Both indexes are merged in linear time from the sorted contents of
    /// the two teams. The new team starts with no games played. Running
    /// out of memory is reported, never fatal.
    pub(crate) fn merged(
        id: TeamId,
        a: &Team,
        b: &Team,
    ) -> Result<Self, TreeError> {
        let n = a.len() + b.len();
        let mut ids = vec_for(n)?;
        ids.extend(
            a.players_by_id
                .iter()
                .merge(&b.players_by_id)
                .map(|(&id, _)| id),
        );
        let (mut keys, mut ranked) = (vec_for(n)?, vec_for(n)?);
        for (&key, &id) in a.players_by_score.iter().merge(&b.players_by_score)
        {
            keys.push(key);
            ranked.push(id);
        }

        let mut res = Self::new(id, a.points + b.points);
        res.players_by_id.build_from_sorted(ids, vec![(); n])?;
        res.players_by_score.build_from_sorted(keys, ranked)?;
        res.goals = a.goals + b.goals;
        res.cards = a.cards + b.cards;
        res.goalkeepers = a.goalkeepers + b.goalkeepers;
        Ok(res)
    }
}

fn vec_for<T>(n: usize) -> Result<Vec<T>, TreeError> {
    let mut res = Vec::new();
    res.try_reserve_exact(n).map_err(|_| TreeError::AllocationFailure)?;
    Ok(res)
}
