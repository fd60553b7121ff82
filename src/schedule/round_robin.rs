//! Circle-method round-robin generation.

use std::collections::HashSet;
use std::hash::Hash;

use super::{ScheduleError, ScheduleWeek};

/// Single round-robin: every team meets every other team exactly once over N-1 weeks.
///
/// `teams[0]` stays fixed while the remaining teams rotate one step clockwise
/// before each week is paired.
pub fn generate_round_robin<T: Clone>(teams: &[T]) -> Result<Vec<ScheduleWeek<T>>, ScheduleError> {
    let n = teams.len();
    if n == 0 {
        return Err(ScheduleError::NoTeams);
    }
    if n % 2 != 0 {
        return Err(ScheduleError::OddTeamCount(n));
    }

    let fixed = &teams[0];
    let mut rotating: Vec<T> = teams[1..].to_vec();
    let mut weeks = Vec::with_capacity(n - 1);

    for _ in 0..n - 1 {
        rotating.rotate_right(1);
        let mut week = Vec::with_capacity(n / 2);
        week.push((fixed.clone(), rotating[0].clone()));
        for i in 1..n / 2 {
            week.push((rotating[i].clone(), rotating[n - 1 - i].clone()));
        }
        weeks.push(week);
    }

    Ok(weeks)
}

/// Round-robin followed by the same weeks with home/away swapped. 2(N-1) weeks.
pub fn generate_double_round_robin<T: Clone>(
    teams: &[T],
) -> Result<Vec<ScheduleWeek<T>>, ScheduleError> {
    let first_half = generate_round_robin(teams)?;
    let second_half: Vec<ScheduleWeek<T>> = first_half
        .iter()
        .map(|week| {
            week.iter()
                .map(|(home, away)| (away.clone(), home.clone()))
                .collect()
        })
        .collect();

    let mut schedule = first_half;
    schedule.extend(second_half);
    Ok(schedule)
}

/// Prefix of the double round-robin, `num_weeks` long at most.
///
/// When the season is shorter than 2(N-1) weeks some pairs only meet once.
pub fn generate_schedule_for_nfl_season<T: Clone>(
    teams: &[T],
    num_weeks: usize,
) -> Result<Vec<ScheduleWeek<T>>, ScheduleError> {
    let mut schedule = generate_double_round_robin(teams)?;
    schedule.truncate(num_weeks);
    Ok(schedule)
}

/// True when no team plays itself and no team appears twice within any week.
pub fn validate_schedule<T: Eq + Hash>(schedule: &[ScheduleWeek<T>]) -> bool {
    schedule.iter().all(|week| {
        let mut seen = HashSet::with_capacity(week.len() * 2);
        week.iter()
            .all(|(home, away)| home != away && seen.insert(home) && seen.insert(away))
    })
}
