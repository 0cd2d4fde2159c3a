use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use log::info;
use xz::bufread::XzDecoder;

use crate::UserConfig;
use crate::data::osm::ElementKind;
use crate::data::rows::{RowCounts, RowSetKind, ShapedElement};
use crate::errors::Result;
use crate::etl::ETL;
use crate::etl::shape::{ShapeOptions, ShapedElements};
use crate::etl::sink::{partial_path, RowSinks};
use crate::etl::walker::OsmElements;

pub const ETL_NAME: &str = "osm_to_csv";

const ELEMENT_KINDS: [ElementKind; 2] = [ElementKind::Node, ElementKind::Way];

pub type OsmReader = Box<dyn BufRead + Send>;

pub fn open_osm(path: &Path) -> Result<OsmReader> {
    let file = fs::File::open(path)?;
    let file_reader = BufReader::new(file);
    if path.extension().is_some_and(|ext| ext == "xz") {
        let xz_reader = XzDecoder::new(file_reader);
        Ok(Box::new(BufReader::new(xz_reader)))
    } else {
        Ok(Box::new(file_reader))
    }
}

pub fn write_rows<W: Write>(
    elements: impl Iterator<Item = Result<ShapedElement>>,
    sinks: &mut RowSinks<W>,
) -> Result<()> {
    for element in elements {
        sinks.write(&element?)?;
    }
    Ok(())
}

pub struct OsmCsvEtl<'a> {
    config: &'a UserConfig,
    counts: Option<RowCounts>,
}

impl OsmCsvEtl<'_> {
    pub fn new(config: &UserConfig) -> OsmCsvEtl {
        OsmCsvEtl {
            config,
            counts: None,
        }
    }

    pub fn row_counts(&self) -> Option<RowCounts> {
        self.counts
    }

    fn output_paths(dir: &Path) -> Vec<PathBuf> {
        RowSetKind::ALL
            .iter()
            .map(|kind| dir.join(kind.file_name()))
            .collect()
    }
}

impl ETL for OsmCsvEtl<'_> {
    type Input = OsmElements<OsmReader>;
    type Output = ShapedElements<OsmElements<OsmReader>>;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        for path in Self::output_paths(dir) {
            if !path.try_exists()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        let partial_paths = RowSetKind::ALL.into_iter().map(|kind| partial_path(dir, kind));
        for path in Self::output_paths(dir).into_iter().chain(partial_paths) {
            if path.try_exists()? {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        let reader = open_osm(Path::new(&self.config.data_path))?;
        Ok(OsmElements::new(reader, &ELEMENT_KINDS))
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let options = ShapeOptions {
            underscores_to_spaces: self.config.underscores_to_spaces,
        };
        Ok(ShapedElements::new(input, options, self.config.validate))
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        let mut sinks: RowSinks<File> = RowSinks::create(dir)?;
        if self.config.show_progress {
            write_rows(tqdm::tqdm(output), &mut sinks)?;
        } else {
            write_rows(output, &mut sinks)?;
        }
        let counts = sinks.commit(dir)?;

        info!(
            etl_name = self.etl_name(),
            nodes = counts.nodes,
            node_tags = counts.node_tags,
            ways = counts.ways,
            way_nodes = counts.way_nodes,
            way_tags = counts.way_tags;
            "Rows written"
        );
        self.counts = Some(counts);
        Ok(())
    }
}
