//! Competition records indexed by AVL trees.
//!
//! Teams and players are each kept in a tree keyed by id; players are
//! additionally ranked, globally and per team, in trees keyed by
//! [`ScoreKey`]. Every mutation keeps all of those trees in step.
//!
//! # Examples
//! ```
//! use worldcup::{StatusError, WorldCup};
//!
//! let mut cup = WorldCup::new();
//! cup.add_team(1, 0).unwrap();
//! cup.add_player(10, 1, 2, 3, 0, true).unwrap();
//! cup.add_player(11, 1, 2, 5, 1, false).unwrap();
//! assert_eq!(cup.top_scorer(None), Ok(11));
//! assert_eq!(cup.all_players(Some(1)), Ok(vec![10, 11]));
//! assert_eq!(cup.remove_team(1), Err(StatusError::Failure));
//! ```

use std::cmp::Ordering;

use avl_tree::{AvlTree, TreeError};
use log::debug;

mod knockout;
mod player;
mod team;

pub use player::{closer_player, Player, PlayerId, ScoreKey, TeamId};
pub use team::Team;

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum StatusError {
    #[error("invalid input")]
    InvalidInput,
    #[error("operation failed")]
    Failure,
    #[error("allocation failed")]
    AllocationError,
}

impl From<TreeError> for StatusError {
    fn from(e: TreeError) -> Self {
        match e {
            TreeError::AllocationFailure => Self::AllocationError,
            TreeError::InvalidInput => Self::InvalidInput,
            _ => Self::Failure,
        }
    }
}

pub type Result<T> = std::result::Result<T, StatusError>;

/// Scoring and eligibility rules.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Rules {
    pub points_for_win: i32,
    pub points_for_tie: i32,
    /// Smallest squad that may play a match.
    pub min_players: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self { points_for_win: 3, points_for_tie: 1, min_players: 11 }
    }
}

#[derive(Debug, Default)]
pub struct WorldCup {
    rules: Rules,
    teams: AvlTree<TeamId, Team>,
    players: AvlTree<PlayerId, Player>,
    players_by_score: AvlTree<ScoreKey, PlayerId>,
}

fn check(ok: bool) -> Result<()> {
    if ok { Ok(()) } else { Err(StatusError::InvalidInput) }
}

impl WorldCup {
    pub fn new() -> Self { Self::default() }

    pub fn with_rules(rules: Rules) -> Self {
        Self { rules, ..Self::default() }
    }

    pub fn rules(&self) -> &Rules { &self.rules }

    pub fn team(&self, team_id: TeamId) -> Result<&Team> {
        Ok(self.teams.find(&team_id)?)
    }

    pub fn player(&self, player_id: PlayerId) -> Result<&Player> {
        Ok(self.players.find(&player_id)?)
    }

    pub fn add_team(&mut self, team_id: TeamId, points: i32) -> Result<()> {
        check(team_id > 0 && points >= 0)?;
        self.teams.insert(team_id, Team::new(team_id, points))?;
        debug!("team {team_id} added with {points} points");
        Ok(())
    }

    /// Removes a team that has no players left.
    pub fn remove_team(&mut self, team_id: TeamId) -> Result<()> {
        check(team_id > 0)?;
        if !self.teams.find(&team_id)?.is_empty() {
            return Err(StatusError::Failure);
        }
        self.teams.remove(&team_id)?;
        debug!("team {team_id} removed");
        Ok(())
    }

    pub fn add_player(
        &mut self,
        player_id: PlayerId,
        team_id: TeamId,
        games: i32,
        goals: i32,
        cards: i32,
        goalkeeper: bool,
    ) -> Result<()> {
        check(player_id > 0 && team_id > 0)?;
        check(games >= 0 && goals >= 0 && cards >= 0)?;
        check(games > 0 || (goals == 0 && cards == 0))?;
        if self.players.contains_key(&player_id) {
            return Err(StatusError::Failure);
        }
        let team = self.teams.find_mut(&team_id)?;

        let player = Player::new(
            player_id,
            team_id,
            games,
            goals,
            cards,
            goalkeeper,
            team.games(),
        );
        self.players.insert(player_id, player)?;
        if let Err(e) =
            self.players_by_score.insert(player.score_key(), player_id)
        {
            self.players.remove(&player_id).ok();
            return Err(e.into());
        }
        if let Err(e) = team.insert_player(&player) {
            self.players_by_score.remove(&player.score_key()).ok();
            self.players.remove(&player_id).ok();
            return Err(e.into());
        }
        debug!("player {player_id} joined team {team_id}");
        Ok(())
    }

    pub fn remove_player(&mut self, player_id: PlayerId) -> Result<()> {
        check(player_id > 0)?;
        let player = *self.players.find(&player_id)?;
        self.teams.find_mut(&player.team)?.remove_player(&player);
        let removed = self.players_by_score.remove(&player.score_key());
        debug_assert!(removed.is_ok());
        self.players.remove(&player_id)?;
        debug!("player {player_id} removed from team {}", player.team);
        Ok(())
    }

    /// Adds `games`, `goals` and `cards` to a player's record.
    pub fn update_player_stats(
        &mut self,
        player_id: PlayerId,
        games: i32,
        goals: i32,
        cards: i32,
    ) -> Result<()> {
        check(player_id > 0)?;
        check(games >= 0 && goals >= 0 && cards >= 0)?;
        let player = self.players.find_mut(&player_id)?;
        let team = self.teams.find_mut(&player.team)?;

        let old = player.score_key();
        let new = ScoreKey {
            goals: old.goals + goals,
            cards: old.cards + cards,
            ..old
        };
        // Both new keys go in before any old one comes out.
        if new != old {
            self.players_by_score.insert(new, player_id)?;
            if let Err(e) = team.rekey_insert(new) {
                self.players_by_score.remove(&new).ok();
                return Err(e.into());
            }
            let removed = self.players_by_score.remove(&old);
            debug_assert!(removed.is_ok());
            team.rekey_finish(old, goals, cards);
        }

        let team_games = team.games();
        player.rebase(player.games_played(team_games) + games, team_games);
        player.goals = new.goals;
        player.cards = new.cards;
        debug!("player {player_id} updated to {new:?}");
        Ok(())
    }

    /// Plays one match between two eligible teams and awards points.
    pub fn play_match(&mut self, team1: TeamId, team2: TeamId) -> Result<()> {
        check(team1 > 0 && team2 > 0 && team1 != team2)?;
        let (t1, t2) = (self.teams.find(&team1)?, self.teams.find(&team2)?);
        if !t1.is_valid(&self.rules) || !t2.is_valid(&self.rules) {
            return Err(StatusError::Failure);
        }
        let Rules { points_for_win: win, points_for_tie: tie, .. } = self.rules;
        let (p1, p2) = match t1.match_score().cmp(&t2.match_score()) {
            Ordering::Greater => (win, 0),
            Ordering::Less => (0, win),
            Ordering::Equal => (tie, tie),
        };
        self.teams.find_mut(&team1)?.record_match(p1);
        self.teams.find_mut(&team2)?.record_match(p2);
        debug!("match {team1} vs {team2}: +{p1} / +{p2}");
        Ok(())
    }

    pub fn num_played_games(&self, player_id: PlayerId) -> Result<i32> {
        check(player_id > 0)?;
        let player = self.players.find(&player_id)?;
        let team = self.teams.find(&player.team)?;
        Ok(player.games_played(team.games()))
    }

    pub fn team_points(&self, team_id: TeamId) -> Result<i32> {
        check(team_id > 0)?;
        Ok(self.teams.find(&team_id)?.points())
    }

    /// Replaces two teams by one holding all of their players and points.
    ///
    /// `new_id` may be one of the two merged ids but no other existing
    /// team. Players keep their game counts; the new team has played none.
    pub fn unite_teams(
        &mut self,
        team1: TeamId,
        team2: TeamId,
        new_id: TeamId,
    ) -> Result<()> {
        check(team1 > 0 && team2 > 0 && new_id > 0 && team1 != team2)?;
        let (t1, t2) = (self.teams.find(&team1)?, self.teams.find(&team2)?);
        let reused = new_id == team1 || new_id == team2;
        if !reused && self.teams.contains_key(&new_id) {
            return Err(StatusError::Failure);
        }

        let merged = Team::merged(new_id, t1, t2)?;
        // Game counts as they stand, to be frozen once the merge commits.
        let mut moved = Vec::new();
        moved
            .try_reserve_exact(merged.len())
            .map_err(|_| StatusError::AllocationError)?;
        for team in [t1, t2] {
            for id in team.ranked() {
                let player = self.players.find(&id)?;
                moved.push((id, player.games_played(team.games())));
            }
        }

        if reused {
            *self.teams.find_mut(&new_id)? = merged;
            let other = if new_id == team1 { team2 } else { team1 };
            self.teams.remove(&other)?;
        } else {
            self.teams.insert(new_id, merged)?;
            self.teams.remove(&team1)?;
            self.teams.remove(&team2)?;
        }
        for (id, games) in moved {
            let player = self.players.find_mut(&id)?;
            player.team = new_id;
            player.rebase(games, 0);
        }
        debug!("teams {team1} and {team2} united as {new_id}");
        Ok(())
    }

    /// Best ranked player overall (`None`) or within a team.
    pub fn top_scorer(&self, team: Option<TeamId>) -> Result<PlayerId> {
        let top = match team {
            None => self.players_by_score.max().map(|key| key.id),
            Some(team_id) => {
                check(team_id > 0)?;
                self.teams.find(&team_id)?.top_scorer()
            }
        };
        top.ok_or(StatusError::Failure)
    }

    pub fn all_players_count(&self, team: Option<TeamId>) -> Result<usize> {
        match team {
            None => Ok(self.players.len()),
            Some(team_id) => {
                check(team_id > 0)?;
                Ok(self.teams.find(&team_id)?.len())
            }
        }
    }

    /// Player ids from the lowest to the highest ranked.
    pub fn all_players(&self, team: Option<TeamId>) -> Result<Vec<PlayerId>> {
        match team {
            None => {
                let ids = self.players_by_score.values().into_iter().copied();
                Ok(ids.collect())
            }
            Some(team_id) => {
                check(team_id > 0)?;
                Ok(self.teams.find(&team_id)?.ranked_ids())
            }
        }
    }

    /// The player ranked closest to `player_id` among all other players,
    /// as judged by [`closer_player`].
    pub fn closest_player(
        &mut self,
        player_id: PlayerId,
        team_id: TeamId,
    ) -> Result<PlayerId> {
        check(player_id > 0 && team_id > 0)?;
        let player = self.players.find(&player_id)?;
        if player.team != team_id {
            return Err(StatusError::Failure);
        }
        let key = player.score_key();

        // Out of the index for the search, so that it cannot find itself.
        // Its node is kept, so putting it back cannot fail.
        let entry = self.players_by_score.detach(&key)?;
        let closest = self
            .players_by_score
            .closest(&key, closer_player)
            .map(|(_, &id)| id);
        let reattached = self.players_by_score.reattach(entry);
        debug_assert!(reattached.is_ok());
        closest.map_err(StatusError::from)
    }

    /// Champion of a knockout among the eligible teams with ids in
    /// `min_id..=max_id`, paired in id order.
    pub fn knockout_winner(
        &self,
        min_id: TeamId,
        max_id: TeamId,
    ) -> Result<TeamId> {
        check(min_id >= 0 && max_id >= 0 && min_id <= max_id)?;
        let teams: Vec<_> = self
            .teams
            .range(&min_id, &max_id, |team| team.is_valid(&self.rules))
            .into_iter()
            .map(|team| (team.id(), team.match_score()))
            .collect();
        debug!("knockout among {} teams", teams.len());
        knockout::champion(teams, self.rules.points_for_win)
            .ok_or(StatusError::Failure)
    }
}

#[cfg(test)]
mod tests;
