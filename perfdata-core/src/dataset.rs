//! Keyed collections of data points for one benchmark run.

use std::collections::btree_map::{self, BTreeMap};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::point::{DataPoint, MergePolicy, PointKey};

#[derive(Debug, Error)]
pub enum DataSetError {
    #[error("failed to write data set to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode data set as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// All points of one run, at most one per key, plus a description label.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataSet {
    description: String,
    #[serde(serialize_with = "serialize_points")]
    points: BTreeMap<PointKey, DataPoint>,
}

fn serialize_points<S>(points: &BTreeMap<PointKey, DataPoint>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(points.values())
}

impl DataSet {
    /// Create an empty data set.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            points: BTreeMap::new(),
        }
    }

    /// Build a data set from points in input order.
    ///
    /// A point whose key is already present is merged into the existing
    /// entry with `policy`, so order-dependent policies favor earlier or
    /// later points accordingly. Invalid points are dropped.
    pub fn from_points<I>(
        description: impl Into<String>,
        points: I,
        policy: MergePolicy,
        diagnostics: &mut Diagnostics,
    ) -> Self
    where
        I: IntoIterator<Item = DataPoint>,
    {
        let mut set = Self::new(description);
        for point in points {
            set.insert(point, policy, diagnostics);
        }
        set
    }

    /// Insert a single point, merging it into an existing entry if needed.
    pub fn insert(&mut self, point: DataPoint, policy: MergePolicy, diagnostics: &mut Diagnostics) {
        if !point.is_valid() {
            diagnostics.push(Diagnostic::InvalidPoint {
                point: point.describe(),
            });
            return;
        }

        match self.points.entry(point.key()) {
            btree_map::Entry::Occupied(mut entry) => {
                diagnostics.record(entry.get_mut().merge(point, policy));
            }
            btree_map::Entry::Vacant(entry) => {
                entry.insert(point);
            }
        }
    }

    /// Merge another data set into this one.
    ///
    /// Both sets are expected to describe the same run. A differing
    /// description is reported but does not stop the merge. Keys only found
    /// in `other` are moved over as they are.
    pub fn merge(&mut self, other: DataSet, policy: MergePolicy, diagnostics: &mut Diagnostics) {
        if self.description != other.description {
            diagnostics.push(Diagnostic::DescriptionMismatch {
                ours: self.description.clone(),
                theirs: other.description.clone(),
            });
        }

        for (key, point) in other.points {
            match self.points.entry(key) {
                btree_map::Entry::Occupied(mut entry) => {
                    diagnostics.record(entry.get_mut().merge(point, policy));
                }
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(point);
                }
            }
        }
    }

    /// Average every point over its observation count.
    pub fn compute_average(&mut self) {
        for point in self.points.values_mut() {
            point.compute_average();
        }
    }

    /// Replace every point by its trimmed average.
    pub fn compute_average_excluding_extremes(&mut self) {
        for point in self.points.values_mut() {
            point.compute_average_excluding_extremes();
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, key: &PointKey) -> Option<&DataPoint> {
        self.points.get(key)
    }

    pub fn contains_key(&self, key: &PointKey) -> bool {
        self.points.contains_key(key)
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> btree_map::Iter<'_, PointKey, DataPoint> {
        self.points.iter()
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> btree_map::Keys<'_, PointKey, DataPoint> {
        self.points.keys()
    }

    /// Write the description header and one line per point, sorted by key.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "# Branch = {}", self.description)?;
        for point in self.points.values() {
            writeln!(writer, "{}", point.to_line())?;
        }
        Ok(())
    }

    /// Write the data set to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), DataSetError> {
        let io_err = |source| DataSetError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer).map_err(io_err)?;
        writer.flush().map_err(io_err)?;

        tracing::debug!(path = %path.display(), points = self.len(), "wrote data set");
        Ok(())
    }

    /// Pretty JSON with the description and the points in key order.
    pub fn to_json_pretty(&self) -> Result<String, DataSetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<'a> IntoIterator for &'a DataSet {
    type Item = (&'a PointKey, &'a DataPoint);
    type IntoIter = btree_map::Iter<'a, PointKey, DataPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
