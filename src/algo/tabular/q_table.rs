use std::{
    collections::HashMap,
    fs::File,
    io::{Read, Write},
    path::Path,
};

use crate::{
    encoding::StateKey,
    env::{Action, ACTION_COUNT},
    error::{Error, Result},
    util::argmax_first,
};

/// One row of action values, indexed by [`Action::index`]
pub type Row = [f64; ACTION_COUNT];

const KEY_COLUMN: &str = "key";

/// Lazily populated table of action values per encoded state
///
/// Rows start at zero the first time a state is touched and are never removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    rows: HashMap<StateKey, Row>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &StateKey) -> Option<&Row> {
        self.rows.get(key)
    }

    /// Values of `key`, all zero for a state that was never seen, without creating a row
    pub fn values(&self, key: &StateKey) -> Row {
        self.rows.get(key).copied().unwrap_or_default()
    }

    /// Mutable row of `key`, created zeroed on first access
    pub fn row_mut(&mut self, key: &StateKey) -> &mut Row {
        self.rows.entry(key.clone()).or_default()
    }

    pub fn insert(&mut self, key: StateKey, row: Row) {
        self.rows.insert(key, row);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &Row)> {
        self.rows.iter()
    }

    /// Highest value in a row
    pub fn max(row: &Row) -> f64 {
        row.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Action with the highest value in a row, the lowest index on ties
    pub fn best_action(row: &Row) -> Action {
        argmax_first(row.iter().copied())
            .and_then(Action::from_repr)
            .unwrap_or(Action::Up)
    }

    /// Write the table as CSV with a `key,a_1,a_2,a_3,a_4` header
    ///
    /// Rows are sorted by key so that saving the same table twice yields identical files.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(header())?;

        let mut keys: Vec<&StateKey> = self.rows.keys().collect();
        keys.sort();
        for key in keys {
            if key.as_str().contains(|c| matches!(c, ',' | '"' | '\n' | '\r')) {
                return Err(Error::InvalidKey {
                    key: key.to_string(),
                });
            }
            let mut record = vec![key.to_string()];
            record.extend(self.rows[key].iter().map(f64::to_string));
            wtr.write_record(&record)?;
        }

        wtr.flush().map_err(|source| Error::Io {
            operation: "flush q-table".into(),
            source,
        })
    }

    /// Read a table written by [`QTable::write_to`]
    ///
    /// Fails on the first malformed row instead of returning a partial table.
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut records = rdr.records();

        let expected = header().join(",");
        let got = match records.next() {
            Some(record) => record?.iter().collect::<Vec<_>>().join(","),
            None => String::new(),
        };
        if got != expected {
            return Err(Error::MalformedHeader { expected, got });
        }

        let mut table = Self::new();
        for record in records {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());
            let malformed = |reason: String| Error::MalformedRow { line, reason };

            if record.len() != ACTION_COUNT + 1 {
                return Err(malformed(format!(
                    "expected {} fields, found {}",
                    ACTION_COUNT + 1,
                    record.len()
                )));
            }

            let key = StateKey::new(&record[0]);
            let mut row = Row::default();
            for (i, field) in record.iter().skip(1).enumerate() {
                row[i] = field.trim().parse().map_err(|e| {
                    malformed(format!("invalid value `{field}` for a_{}: {e}", i + 1))
                })?;
            }

            if table.rows.insert(key, row).is_some() {
                return Err(malformed(format!("duplicate key `{}`", &record[0])));
            }
        }

        Ok(table)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create {}", path.display()),
            source,
        })?;
        self.write_to(file)?;
        log::info!("saved {} q-table rows to {}", self.len(), path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open {}", path.display()),
            source,
        })?;
        let table = Self::read_from(file)?;
        log::info!("loaded {} q-table rows from {}", table.len(), path.display());
        Ok(table)
    }
}

fn header() -> Vec<String> {
    std::iter::once(KEY_COLUMN.to_string())
        .chain((1..=ACTION_COUNT).map(|i| format!("a_{i}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> StateKey {
        StateKey::new(s)
    }

    fn sample() -> QTable {
        let mut table = QTable::new();
        table.insert(key("~~@.X3"), [-7.25, 0.1, 1e-9, 1000.0]);
        table.insert(key("~.@.X2"), [0.0, -0.333_333_333_333_333_3, 42.0, -1e12]);
        table.insert(key("#@m1"), [0.0; 4]);
        table
    }

    #[test]
    fn lazy_rows_start_at_zero() {
        let mut table = QTable::new();
        assert_eq!(table.values(&key("a1")), [0.0; 4]);
        assert!(table.is_empty(), "reading values does not create rows");

        table.row_mut(&key("a1"))[2] = 3.0;
        assert_eq!(table.get(&key("a1")), Some(&[0.0, 0.0, 3.0, 0.0]));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn best_action_prefers_lowest_index() {
        assert_eq!(QTable::best_action(&[0.0; 4]), Action::Up);
        assert_eq!(QTable::best_action(&[-1.0, 2.0, 2.0, 0.0]), Action::Right);
        assert_eq!(QTable::best_action(&[-1.0, -2.0, -3.0, -0.5]), Action::Left);
        assert_eq!(QTable::max(&[-1.0, -2.0, -3.0, -0.5]), -0.5);
    }

    #[test]
    fn file_round_trip() {
        let table = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map0.csv");

        table.save(&path).unwrap();
        let loaded = QTable::load(&path).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn csv_layout() {
        let mut table = QTable::new();
        table.insert(key("~@X3"), [1.5, -2.0, 0.0, 0.25]);
        let mut buf = Vec::new();
        table.write_to(&mut buf).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "key,a_1,a_2,a_3,a_4\n~@X3,1.5,-2,0,0.25\n"
        );
    }

    #[test]
    fn rejects_delimiter_in_key() {
        let mut table = QTable::new();
        table.insert(key("a,b"), [0.0; 4]);
        assert!(matches!(
            table.write_to(Vec::new()),
            Err(Error::InvalidKey { .. })
        ));
    }

    #[test]
    fn rejects_wrong_column_count() {
        let csv = "key,a_1,a_2,a_3,a_4\nok3,1,2,3,4\nbad3,1,2,3\n";
        match QTable::read_from(csv.as_bytes()) {
            Err(Error::MalformedRow { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_unparsable_value() {
        let csv = "key,a_1,a_2,a_3,a_4\nbad3,1,two,3,4\n";
        match QTable::read_from(csv.as_bytes()) {
            Err(Error::MalformedRow { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("a_2"), "reason names the column: {reason}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_header() {
        assert!(matches!(
            QTable::read_from("state,q\n".as_bytes()),
            Err(Error::MalformedHeader { .. })
        ));
        assert!(matches!(
            QTable::read_from("".as_bytes()),
            Err(Error::MalformedHeader { .. })
        ));
    }

    #[test]
    fn header_only_is_empty_table() {
        let table = QTable::read_from("key,a_1,a_2,a_3,a_4\n".as_bytes()).unwrap();
        assert!(table.is_empty());
    }
}
