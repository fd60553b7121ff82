//! Deterministic synthetic player pool for tests, benchmarks and dry runs.

use super::player::{InjuryStatus, Player, Position, SEASON_WEEKS};
use crate::rng::Rng;

const NFL_TEAMS: usize = 32;

/// (position, players generated, top weekly projection, weekly drop per depth rank)
const POSITION_PROFILES: [(Position, usize, f64, f64); 6] = [
    (Position::Qb, 36, 24.0, 0.35),
    (Position::Rb, 70, 19.0, 0.22),
    (Position::Wr, 86, 18.0, 0.17),
    (Position::Te, 36, 13.0, 0.22),
    (Position::K, 32, 9.5, 0.08),
    (Position::Dst, 32, 9.0, 0.16),
];

/// Generate a realistic-looking pool of roughly 290 players.
///
/// The same seed always produces the same pool, including projected and
/// "actual" weekly points.
pub fn synthetic_players(seed: u64) -> Vec<Player> {
    let mut rng = Rng::new(seed);
    let mut players = Vec::new();
    let mut next_id = 1u32;

    for (position, count, top, drop) in POSITION_PROFILES {
        for depth in 0..count {
            let team_idx = if position == Position::Dst || position == Position::K {
                depth % NFL_TEAMS
            } else {
                rng.below(NFL_TEAMS)
            };
            let team = format!("T{:02}", team_idx + 1);
            let bye_week = 5 + (team_idx % 10) as u32;
            let base = (top - drop * depth as f64).max(1.0) * (0.9 + 0.2 * rng.next_f64());
            let spread = if position == Position::Dst { 7.0 } else { base * 0.45 };

            let mut weekly_points = Vec::with_capacity(SEASON_WEEKS);
            let mut weekly_actual = Vec::with_capacity(SEASON_WEEKS);
            for week in 1..=SEASON_WEEKS as u32 {
                if week == bye_week {
                    weekly_points.push(0.0);
                    weekly_actual.push(0.0);
                    continue;
                }
                let projected = base + spread * (rng.next_f64() - 0.5);
                let projected = if position == Position::Dst {
                    projected
                } else {
                    projected.max(0.0)
                };
                let actual = projected + spread * 1.5 * (rng.next_f64() - 0.5);
                weekly_points.push(round2(projected));
                weekly_actual.push(round2(actual));
            }

            let injury_roll = rng.next_f64();
            let injury_status = if injury_roll < 0.04 {
                InjuryStatus::High
            } else if injury_roll < 0.14 {
                InjuryStatus::Medium
            } else {
                InjuryStatus::Low
            };

            let rating = (95.0 - depth as f64 * 100.0 / count as f64 + 10.0 * (rng.next_f64() - 0.5))
                .clamp(0.0, 100.0);

            players.push(Player {
                id: next_id,
                name: format!("{} {} {}", team, position, depth + 1),
                position,
                team,
                bye_week: Some(bye_week),
                weekly_points,
                average_draft_position: None,
                player_rating: round2(rating),
                injury_status,
                weekly_actual_points: Some(weekly_actual),
            });
            next_id += 1;
        }
    }

    assign_adp(&mut players, &mut rng);
    players
}

/// ADP follows overall projection order with some noise; deep bench players get none.
fn assign_adp(players: &mut [Player], rng: &mut Rng) {
    let mut order: Vec<usize> = (0..players.len()).collect();
    order.sort_by(|&a, &b| {
        players[b]
            .season_projection()
            .total_cmp(&players[a].season_projection())
            .then_with(|| players[a].id.cmp(&players[b].id))
    });
    for (rank, idx) in order.into_iter().enumerate() {
        if rank >= 220 {
            break;
        }
        let noisy = rank as f64 + 1.0 + 12.0 * (rng.next_f64() - 0.5);
        players[idx].average_draft_position = Some(round2(noisy.max(1.0)));
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
