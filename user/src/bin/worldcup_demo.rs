use log::info;
use worldcup::{Result, WorldCup};

fn main() -> Result<()> {
    env_logger::init();

    let mut cup = WorldCup::new();
    for team in 1..=4 {
        cup.add_team(team, 0)?;
        for i in 0..11 {
            let id = team * 100 + i;
            cup.add_player(id, team, 1, (id * 7) % 5, i % 3, i == 0)?;
        }
    }
    cup.play_match(1, 2)?;
    cup.play_match(3, 4)?;
    cup.update_player_stats(204, 1, 3, 0)?;
    info!("top scorer: {}", cup.top_scorer(None)?);

    cup.unite_teams(1, 2, 5)?;
    info!("team 5 has {} players", cup.all_players_count(Some(5))?);
    info!("closest to 204: {}", cup.closest_player(204, 5)?);
    info!("champion: {}", cup.knockout_winner(0, 10)?);
    Ok(())
}
