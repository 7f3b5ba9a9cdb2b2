//! Reporting utilities: summaries, checksum tables, and SQL verification.

pub mod format;

pub use format::*;

use crate::domain::PopulationGrid;
use crate::io::sql::SqlRow;

/// Compare parsed SQL rows with the rows a fresh grid would produce.
pub fn compare_sql_rows(grid: &PopulationGrid, parsed: &[SqlRow]) -> VerifyOutcome {
    let expected: Vec<SqlRow> = grid
        .rows()
        .map(|r| SqlRow {
            year_id: r.year_id,
            age: r.age,
            population: r.population,
        })
        .collect();

    let n = expected.len().max(parsed.len());
    let mismatches = (0..n)
        .filter_map(|i| {
            let e = expected.get(i).copied();
            let f = parsed.get(i).copied();
            (e != f).then_some((e, f))
        })
        .collect();

    VerifyOutcome {
        expected: expected.len(),
        found: parsed.len(),
        mismatches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::YearSeries;

    fn grid() -> PopulationGrid {
        PopulationGrid {
            series: vec![YearSeries {
                year: 2000,
                year_id: 0,
                populations: vec![3, 1, 2],
            }],
        }
    }

    #[test]
    fn identical_rows_are_clean() {
        let parsed = vec![
            SqlRow { year_id: 0, age: 0, population: 3 },
            SqlRow { year_id: 0, age: 1, population: 1 },
            SqlRow { year_id: 0, age: 2, population: 2 },
        ];
        let outcome = compare_sql_rows(&grid(), &parsed);
        assert!(outcome.is_clean());
        assert_eq!(outcome.expected, 3);
    }

    #[test]
    fn changed_and_missing_rows_are_reported() {
        let parsed = vec![
            SqlRow { year_id: 0, age: 0, population: 3 },
            SqlRow { year_id: 0, age: 1, population: 9 },
        ];
        let outcome = compare_sql_rows(&grid(), &parsed);
        assert_eq!(outcome.mismatches.len(), 2);
        assert_eq!(outcome.mismatches[1].1, None);
        assert_eq!(outcome.found, 2);
    }
}
