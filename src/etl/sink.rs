use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use log::debug;
use serde::Serialize;

use crate::data::rows::{RowCounts, RowSetKind, ShapedElement};
use crate::errors::Result;

/// Append-only CSV destination for one row-set. The header is written on open.
pub struct RowSink<W: Write> {
    kind: RowSetKind,
    writer: csv::Writer<W>,
    rows: u64,
}

impl<W: Write> RowSink<W> {
    pub fn new(kind: RowSetKind, inner: W) -> Result<RowSink<W>> {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(kind.columns())?;
        Ok(RowSink {
            kind,
            writer,
            rows: 0,
        })
    }

    pub fn write<T: Serialize>(&mut self, row: &T) -> Result<()> {
        self.writer.serialize(row)?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_all<'a, T: Serialize + 'a>(&mut self, rows: impl IntoIterator<Item = &'a T>) -> Result<()> {
        for row in rows {
            self.write(row)?;
        }
        Ok(())
    }

    pub fn kind(&self) -> RowSetKind {
        self.kind
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| crate::errors::Error::Io(err.into_error()))
    }
}

pub struct RowSinks<W: Write> {
    pub nodes: RowSink<W>,
    pub node_tags: RowSink<W>,
    pub ways: RowSink<W>,
    pub way_nodes: RowSink<W>,
    pub way_tags: RowSink<W>,
}

pub fn partial_path(dir: &Path, kind: RowSetKind) -> PathBuf {
    dir.join(format!("{}.partial", kind.file_name()))
}

impl RowSinks<File> {
    /// Create (or truncate) one `.csv.partial` file per row-set inside `dir`.
    /// Nothing appears under the final names until `commit`.
    pub fn create(dir: &Path) -> Result<RowSinks<File>> {
        RowSinks::open(|kind| Ok(File::create(partial_path(dir, kind))?))
    }

    pub fn commit(self, dir: &Path) -> Result<RowCounts> {
        let counts = self.finish()?;
        for kind in RowSetKind::ALL {
            fs::rename(partial_path(dir, kind), dir.join(kind.file_name()))?;
        }
        Ok(counts)
    }
}

impl<W: Write> RowSinks<W> {
    pub fn open(mut open: impl FnMut(RowSetKind) -> Result<W>) -> Result<RowSinks<W>> {
        let mut sink = |kind| -> Result<RowSink<W>> { RowSink::new(kind, open(kind)?) };
        Ok(RowSinks {
            nodes: sink(RowSetKind::Nodes)?,
            node_tags: sink(RowSetKind::NodeTags)?,
            ways: sink(RowSetKind::Ways)?,
            way_nodes: sink(RowSetKind::WayNodes)?,
            way_tags: sink(RowSetKind::WayTags)?,
        })
    }

    pub fn write(&mut self, element: &ShapedElement) -> Result<()> {
        match element {
            ShapedElement::Node { node, tags } => {
                self.nodes.write(node)?;
                self.node_tags.write_all(tags)
            }
            ShapedElement::Way { way, nodes, tags } => {
                self.ways.write(way)?;
                self.way_nodes.write_all(nodes)?;
                self.way_tags.write_all(tags)
            }
        }
    }

    pub fn counts(&self) -> RowCounts {
        RowCounts {
            nodes: self.nodes.rows(),
            node_tags: self.node_tags.rows(),
            ways: self.ways.rows(),
            way_nodes: self.way_nodes.rows(),
            way_tags: self.way_tags.rows(),
        }
    }

    fn each_mut(&mut self) -> [&mut RowSink<W>; 5] {
        [
            &mut self.nodes,
            &mut self.node_tags,
            &mut self.ways,
            &mut self.way_nodes,
            &mut self.way_tags,
        ]
    }

    pub fn finish(mut self) -> Result<RowCounts> {
        for sink in self.each_mut() {
            sink.flush()?;
            debug!(row_set = sink.kind().table_name(), rows = sink.rows(); "Flushed row set");
        }
        Ok(self.counts())
    }
}
