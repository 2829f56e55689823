use crate::player::TeamId;

/// Plays a single-elimination tournament over `teams`, given as
/// `(id, score)` in bracket order, and returns the champion.
///
/// Every round pairs neighbours; the higher score wins, a tie goes to the
/// larger id, and the winner moves on carrying both scores plus `bonus`.
/// An unpaired last team moves on as it is.
pub(crate) fn champion(
    mut teams: Vec<(TeamId, i32)>,
    bonus: i32,
) -> Option<TeamId> {
    while teams.len() > 1 {
        teams = teams
            .chunks(2)
            .map(|pair| match *pair {
                [(a, sa), (b, sb)] => {
                    let winner = if (sa, a) > (sb, b) { a } else { b };
                    (winner, sa + sb + bonus)
                }
                [single] => single,
                _ => unreachable!(),
            })
            .collect();
    }
    teams.first().map(|&(id, _)| id)
}

#[test]
fn brackets() {
    assert_eq!(champion(vec![], 3), None);
    assert_eq!(champion(vec![(4, -10)], 3), Some(4));
    assert_eq!(champion(vec![(1, 5), (2, 4)], 3), Some(1));
    assert_eq!(champion(vec![(1, 4), (2, 4)], 3), Some(2));

    // (1, 2) -> 1 with 10, (3) -> 3 with 8; 1 beats 3.
    assert_eq!(champion(vec![(1, 6), (2, 1), (3, 8)], 3), Some(1));
    // (1, 2) -> 2 with 7, (3, 4) -> 3 with 9; 3 wins the final.
    let teams = vec![(1, 1), (2, 3), (3, 5), (4, 1)];
    assert_eq!(champion(teams, 3), Some(3));
    // Without the bonus the carried sums tie and the larger id wins.
    let teams = vec![(1, 1), (2, 5), (3, 3), (4, 3)];
    assert_eq!(champion(teams, 0), Some(4));
}
