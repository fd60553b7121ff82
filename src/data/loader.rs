//! Load a player pool from a JSON array or a CSV export.
//!
//! CSV columns: id, name, position, team, bye_week, average_draft_position,
//! player_rating, injury_status, week_1_points .. week_17_points, and optionally
//! week_1_actual .. week_17_actual.

use std::fs;
use std::path::Path;

use tracing::info;

use super::player::{InjuryStatus, Player, Position, SEASON_WEEKS};
use super::pool::PlayerPool;
use super::PoolError;

/// Default player pool location used by the CLI.
pub const DEFAULT_PLAYER_POOL_PATH: &str = "sim_data/players.csv";

/// Read a pool from `path`, choosing the format from the file extension.
pub fn load_player_pool(path: impl AsRef<Path>) -> Result<PlayerPool, PoolError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| PoolError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let players = if is_csv {
        parse_players_csv(&raw)?
    } else {
        serde_json::from_str::<Vec<Player>>(&raw)?
    };
    let pool = PlayerPool::new(players)?;
    info!(path = %path.display(), players = pool.len(), "loaded player pool");
    Ok(pool)
}

pub fn parse_players_csv(raw: &str) -> Result<Vec<Player>, PoolError> {
    let mut reader = csv::Reader::from_reader(raw.as_bytes());
    let headers = reader.headers()?.clone();
    let columns = CsvColumns::from_headers(&headers)?;

    let mut players = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        players.push(columns.player_from_record(row + 2, &record)?);
    }
    Ok(players)
}

struct CsvColumns {
    id: usize,
    name: usize,
    position: usize,
    team: usize,
    bye_week: Option<usize>,
    adp: Option<usize>,
    rating: Option<usize>,
    injury: Option<usize>,
    weeks: Vec<usize>,
    actuals: Option<Vec<usize>>,
}

impl CsvColumns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, PoolError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| find(name).ok_or_else(|| PoolError::MissingColumn(name.to_string()));

        let weeks = (1..=SEASON_WEEKS)
            .map(|week| require(&format!("week_{week}_points")))
            .collect::<Result<Vec<_>, _>>()?;
        let actuals = (1..=SEASON_WEEKS)
            .map(|week| find(&format!("week_{week}_actual")))
            .collect::<Option<Vec<_>>>();

        Ok(Self {
            id: require("id")?,
            name: require("name")?,
            position: require("position")?,
            team: require("team")?,
            bye_week: find("bye_week"),
            adp: find("average_draft_position"),
            rating: find("player_rating"),
            injury: find("injury_status"),
            weeks,
            actuals,
        })
    }

    fn player_from_record(&self, row: usize, record: &csv::StringRecord) -> Result<Player, PoolError> {
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();
        let invalid = |column: &str, idx: usize| PoolError::InvalidField {
            row,
            column: column.to_string(),
            value: field(idx).to_string(),
        };
        let optional_f64 = |column: &str, idx: Option<usize>| -> Result<Option<f64>, PoolError> {
            match idx.map(field) {
                None | Some("") => Ok(None),
                Some(value) => value.parse::<f64>().map(Some).map_err(|_| invalid(column, idx.unwrap_or(0))),
            }
        };

        let id = field(self.id).parse::<u32>().map_err(|_| invalid("id", self.id))?;
        let position = Position::parse(field(self.position)).ok_or_else(|| invalid("position", self.position))?;
        let injury_status = match self.injury {
            Some(idx) => InjuryStatus::parse(field(idx)).ok_or_else(|| invalid("injury_status", idx))?,
            None => InjuryStatus::Low,
        };
        let bye_week = optional_f64("bye_week", self.bye_week)?
            .map(|week| week as u32)
            .filter(|week| *week > 0);

        let weekly_points = self
            .weeks
            .iter()
            .map(|&idx| field(idx).parse::<f64>().map_err(|_| invalid("week_points", idx)))
            .collect::<Result<Vec<_>, _>>()?;
        let weekly_actual_points = match &self.actuals {
            Some(columns) => Some(
                columns
                    .iter()
                    .map(|&idx| field(idx).parse::<f64>().map_err(|_| invalid("week_actual", idx)))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        Ok(Player {
            id,
            name: field(self.name).to_string(),
            position,
            team: field(self.team).to_string(),
            bye_week,
            weekly_points,
            average_draft_position: optional_f64("average_draft_position", self.adp)?,
            player_rating: optional_f64("player_rating", self.rating)?.unwrap_or(50.0),
            injury_status,
            weekly_actual_points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(with_actuals: bool) -> String {
        let mut columns: Vec<String> = [
            "id", "name", "position", "team", "bye_week",
            "average_draft_position", "player_rating", "injury_status",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        columns.extend((1..=SEASON_WEEKS).map(|w| format!("week_{w}_points")));
        if with_actuals {
            columns.extend((1..=SEASON_WEEKS).map(|w| format!("week_{w}_actual")));
        }
        columns.join(",")
    }

    fn row(id: u32, position: &str, injury: &str, with_actuals: bool) -> String {
        let mut fields = vec![
            id.to_string(),
            format!("Player {id}"),
            position.to_string(),
            "KC".to_string(),
            "7".to_string(),
            "".to_string(),
            "81".to_string(),
            injury.to_string(),
        ];
        fields.extend((1..=SEASON_WEEKS).map(|w| format!("{}.5", w)));
        if with_actuals {
            fields.extend((1..=SEASON_WEEKS).map(|_| "4".to_string()));
        }
        fields.join(",")
    }

    #[test]
    fn parses_csv_rows() {
        let raw = format!(
            "{}\n{}\n{}\n",
            header(false),
            row(1, "QB", "LOW", false),
            row(2, "DEF", "QUESTIONABLE", false)
        );
        let players = parse_players_csv(&raw).unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].position, Position::Qb);
        assert_eq!(players[0].bye_week, Some(7));
        assert_eq!(players[0].average_draft_position, None);
        assert_eq!(players[0].weekly_points[16], 17.5);
        assert_eq!(players[1].position, Position::Dst);
        assert_eq!(players[1].injury_status, InjuryStatus::Medium);
        assert!(players[1].weekly_actual_points.is_none());
    }

    #[test]
    fn parses_optional_actual_columns() {
        let raw = format!("{}\n{}\n", header(true), row(5, "WR", "", true));
        let players = parse_players_csv(&raw).unwrap();
        assert_eq!(players[0].weekly_actual_points.as_ref().map(Vec::len), Some(SEASON_WEEKS));
    }

    #[test]
    fn reports_missing_columns_and_bad_fields() {
        let err = parse_players_csv("id,name,position\n1,a,QB\n").unwrap_err();
        assert!(matches!(err, PoolError::MissingColumn(column) if column == "team" || column.starts_with("week_")));

        let raw = format!("{}\n{}\n", header(false), row(3, "LB", "LOW", false));
        let err = parse_players_csv(&raw).unwrap_err();
        assert!(matches!(err, PoolError::InvalidField { row: 2, column, .. } if column == "position"));
    }
}
