use std::cmp::Ordering;

pub type PlayerId = i32;
pub type TeamId = i32;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub team: TeamId,
    pub goals: i32,
    pub cards: i32,
    pub goalkeeper: bool,
    // Games recorded at the last rebase, and the team's game count then.
    games_base: i32,
    games_at_join: i32,
}

impl Player {
    pub(crate) fn new(
        id: PlayerId,
        team: TeamId,
        games: i32,
        goals: i32,
        cards: i32,
        goalkeeper: bool,
        team_games: i32,
    ) -> Self {
        Self {
            id,
            team,
            goals,
            cards,
            goalkeeper,
            games_base: games,
            games_at_join: team_games,
        }
    }

    /// Total games, given the current game count of the player's team.
    pub fn games_played(&self, team_games: i32) -> i32 {
        self.games_base + team_games - self.games_at_join
    }

    /// Freezes the game count at `games` while the team stands at
    /// `team_games`.
    pub(crate) fn rebase(&mut self, games: i32, team_games: i32) {
        self.games_base = games;
        self.games_at_join = team_games;
    }

    pub fn score_key(&self) -> ScoreKey {
        ScoreKey { goals: self.goals, cards: self.cards, id: self.id }
    }
}

/// Ranking key: more goals rank higher, then fewer cards, then the larger
/// id. The best player is the maximum.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ScoreKey {
    pub goals: i32,
    pub cards: i32,
    pub id: PlayerId,
}

impl Ord for ScoreKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.goals
            .cmp(&other.goals)
            .then_with(|| other.cards.cmp(&self.cards))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for ScoreKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `Greater` if `a` is closer to `reference` than `b`.
///
/// Closeness compares the absolute goal difference, then the card
/// difference, then the id difference; a complete tie goes to the larger
/// id.
pub fn closer_player(
    a: &ScoreKey,
    b: &ScoreKey,
    reference: &ScoreKey,
) -> Ordering {
    let dist = |p: &ScoreKey| {
        (
            (p.goals - reference.goals).abs(),
            (p.cards - reference.cards).abs(),
            (p.id - reference.id).abs(),
        )
    };
    dist(b).cmp(&dist(a)).then_with(|| a.id.cmp(&b.id))
}

#[test]
fn ranking() {
    let key = |goals, cards, id| ScoreKey { goals, cards, id };
    assert!(key(3, 9, 1) > key(2, 0, 9));
    assert!(key(3, 1, 1) > key(3, 2, 9));
    assert!(key(3, 1, 5) > key(3, 1, 4));
    assert_eq!(key(3, 1, 5).cmp(&key(3, 1, 5)), Ordering::Equal);
}

#[test]
fn closeness() {
    use Ordering::{Greater, Less};
    let key = |goals, cards, id| ScoreKey { goals, cards, id };
    let r = key(5, 5, 10);
    let closer = |a, b| closer_player(&a, &b, &r);
    assert_eq!(closer(key(6, 0, 1), key(3, 5, 10)), Greater);
    assert_eq!(closer(key(4, 7, 1), key(6, 4, 2)), Less);
    assert_eq!(closer(key(5, 5, 8), key(5, 5, 13)), Greater);
    // Same distance on every field.
    assert_eq!(closer(key(4, 6, 8), key(6, 4, 12)), Less);
    assert_eq!(closer(key(6, 4, 12), key(4, 6, 8)), Greater);
}

#[test]
fn games() {
    let mut p = Player::new(1, 1, 4, 0, 0, false, 10);
    assert_eq!(p.games_played(10), 4);
    assert_eq!(p.games_played(13), 7);
    p.rebase(p.games_played(13) + 2, 13);
    assert_eq!(p.games_played(13), 9);
    assert_eq!(p.games_played(14), 10);
}
