//! Lookup of pre-computed clustering artifacts.
//!
//! The clusterings are produced offline. Each use case owns a directory with
//! the library table and one sub-directory per granularity:
//!
//! ```text
//! <root>/<use_case>/data.xlsx
//! <root>/<use_case>/<granularity>/<granularity>_excel.xlsx
//! <root>/<use_case>/<granularity>/<granularity>_{doc_map,map,tot}.json
//! ```
//!
//! The library table carries `Name` and `Content` plus one `<granularity>_topics`
//! column per clustering; the topic table carries `Topic` and `Name`.

mod tables;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use self::tables::Sheet;
use crate::domain::{DomainError, Granularity};

/// Chart flavours rendered for a clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FigureKind {
    /// Every library document in 2D space.
    DocMap,
    /// Cluster overview.
    Map,
    /// Topic frequencies over time.
    TopicsOverTime,
}

impl FigureKind {
    fn suffix(&self) -> &'static str {
        match self {
            FigureKind::DocMap => "doc_map",
            FigureKind::Map => "map",
            FigureKind::TopicsOverTime => "tot",
        }
    }
}

/// Paths of every artifact shown for one use case at one granularity.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSet {
    pub use_case: String,
    pub granularity: Granularity,
    pub library_table: PathBuf,
    pub topic_table: PathBuf,
    pub figures: Vec<(FigureKind, PathBuf)>,
}

/// One document of the clustered library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryRow {
    pub name: String,
    pub content: String,
}

/// One topic found by a clustering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicRow {
    pub topic: String,
    pub name: String,
}

/// A library document with the topic it was sorted into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusteredRow {
    pub topic: String,
    pub name: String,
    pub content: String,
}

/// Everything shown for one use case at one granularity.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterOverview {
    pub artifacts: ArtifactSet,
    pub library: Vec<LibraryRow>,
    pub topics: Vec<TopicRow>,
    pub clustered_library: Vec<ClusteredRow>,
}

pub struct ClusterArtifacts {
    root: PathBuf,
    topics_over_time: BTreeSet<String>,
}

impl ClusterArtifacts {
    pub fn new(
        root: impl Into<PathBuf>,
        topics_over_time: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            root: root.into(),
            topics_over_time: topics_over_time.into_iter().map(Into::into).collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn library_table(&self, use_case: &str) -> PathBuf {
        self.root.join(use_case).join("data.xlsx")
    }

    pub fn topic_table(&self, use_case: &str, granularity: Granularity) -> PathBuf {
        let g = granularity.dir_name();
        self.root.join(use_case).join(g).join(format!("{g}_excel.xlsx"))
    }

    pub fn figure_path(&self, use_case: &str, granularity: Granularity, kind: FigureKind) -> PathBuf {
        let g = granularity.dir_name();
        self.root
            .join(use_case)
            .join(g)
            .join(format!("{g}_{}.json", kind.suffix()))
    }

    /// Figures available for `use_case`; topics over time only exist for
    /// use cases with dated documents.
    pub fn figures(&self, use_case: &str) -> Vec<FigureKind> {
        let mut kinds = vec![FigureKind::DocMap, FigureKind::Map];
        if self.topics_over_time.contains(use_case) {
            kinds.push(FigureKind::TopicsOverTime);
        }
        kinds
    }

    pub fn artifact_set(&self, use_case: &str, granularity: Granularity) -> ArtifactSet {
        ArtifactSet {
            use_case: use_case.to_string(),
            granularity,
            library_table: self.library_table(use_case),
            topic_table: self.topic_table(use_case, granularity),
            figures: self
                .figures(use_case)
                .into_iter()
                .map(|kind| (kind, self.figure_path(use_case, granularity, kind)))
                .collect(),
        }
    }

    pub fn topics(&self, use_case: &str, granularity: Granularity) -> Result<Vec<TopicRow>, DomainError> {
        let rows = Sheet::open(&self.topic_table(use_case, granularity))?.project(["Topic", "Name"])?;
        Ok(rows
            .into_iter()
            .map(|[topic, name]| TopicRow { topic, name })
            .collect())
    }

    /// Library, topic table and the library sorted into the topics of
    /// `granularity`. The library table is read once.
    pub fn overview(&self, use_case: &str, granularity: Granularity) -> Result<ClusterOverview, DomainError> {
        let library = Sheet::open(&self.library_table(use_case))?;

        Ok(ClusterOverview {
            artifacts: self.artifact_set(use_case, granularity),
            library: library_rows(&library)?,
            topics: self.topics(use_case, granularity)?,
            clustered_library: clustered_rows(&library, granularity)?,
        })
    }

    /// Loads a chart definition.
    ///
    /// The export pipeline writes either the chart object itself or the chart
    /// serialized once more as a JSON string; both are accepted.
    pub fn load_figure(
        &self,
        use_case: &str,
        granularity: Granularity,
        kind: FigureKind,
    ) -> Result<Value, DomainError> {
        if !self.figures(use_case).contains(&kind) {
            return Err(DomainError::not_found(format!(
                "use case '{use_case}' has no {} figure",
                kind.suffix()
            )));
        }

        let path = self.figure_path(use_case, granularity, kind);
        debug!(target: "playground::artifacts", path = %path.display(), "loading figure");

        let raw = std::fs::read(&path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => {
                DomainError::not_found(format!("figure {}", path.display()))
            }
            _ => DomainError::storage(format!("failed to read {}: {err}", path.display())),
        })?;

        let value: Value = serde_json::from_slice(&raw)
            .map_err(|err| DomainError::storage(format!("invalid figure {}: {err}", path.display())))?;

        match value {
            Value::String(inner) => serde_json::from_str(&inner).map_err(|err| {
                DomainError::storage(format!("invalid figure {}: {err}", path.display()))
            }),
            other => Ok(other),
        }
    }
}

fn library_rows(sheet: &Sheet) -> Result<Vec<LibraryRow>, DomainError> {
    Ok(sheet
        .project(["Name", "Content"])?
        .into_iter()
        .map(|[name, content]| LibraryRow { name, content })
        .collect())
}

fn clustered_rows(sheet: &Sheet, granularity: Granularity) -> Result<Vec<ClusteredRow>, DomainError> {
    let topic_column = format!("{}_topics", granularity.dir_name());
    Ok(sheet
        .project([topic_column.as_str(), "Name", "Content"])?
        .into_iter()
        .map(|[topic, name, content]| ClusteredRow {
            topic,
            name,
            content,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rust_xlsxwriter::Workbook;
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_paths_follow_layout() {
        let artifacts = ClusterArtifacts::new("/data/magicsort", ["news"]);

        assert_eq!(
            artifacts.library_table("news"),
            PathBuf::from("/data/magicsort/news/data.xlsx")
        );
        assert_eq!(
            artifacts.topic_table("news", Granularity::Fine),
            PathBuf::from("/data/magicsort/news/fine/fine_excel.xlsx")
        );
        assert_eq!(
            artifacts.figure_path("news", Granularity::Broad, FigureKind::DocMap),
            PathBuf::from("/data/magicsort/news/broad/broad_doc_map.json")
        );
    }

    #[test]
    fn test_topics_over_time_only_for_listed_use_cases() {
        let artifacts = ClusterArtifacts::new("/data", ["news"]);

        assert_eq!(
            artifacts.figures("news"),
            vec![FigureKind::DocMap, FigureKind::Map, FigureKind::TopicsOverTime]
        );
        assert_eq!(artifacts.figures("recipes"), vec![FigureKind::DocMap, FigureKind::Map]);
        assert_eq!(artifacts.artifact_set("recipes", Granularity::Broad).figures.len(), 2);
    }

    #[test]
    fn test_load_figure_accepts_both_encodings() {
        let dir = tempdir().unwrap();
        let broad = dir.path().join("news").join("broad");
        fs::create_dir_all(&broad).unwrap();

        let chart = json!({ "data": [{ "type": "scatter" }], "layout": {} });
        fs::write(broad.join("broad_map.json"), chart.to_string()).unwrap();
        fs::write(
            broad.join("broad_doc_map.json"),
            serde_json::to_string(&chart.to_string()).unwrap(),
        )
        .unwrap();

        let artifacts = ClusterArtifacts::new(dir.path(), Vec::<String>::new());
        assert_eq!(
            artifacts
                .load_figure("news", Granularity::Broad, FigureKind::Map)
                .unwrap(),
            chart
        );
        assert_eq!(
            artifacts
                .load_figure("news", Granularity::Broad, FigureKind::DocMap)
                .unwrap(),
            chart
        );
    }

    #[test]
    fn test_missing_figures_are_not_found() {
        let dir = tempdir().unwrap();
        let artifacts = ClusterArtifacts::new(dir.path(), Vec::<String>::new());

        let err = artifacts
            .load_figure("news", Granularity::Fine, FigureKind::Map)
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        let err = artifacts
            .load_figure("news", Granularity::Fine, FigureKind::TopicsOverTime)
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    fn write_news_fixture(root: &Path) {
        let use_case = root.join("news");
        fs::create_dir_all(use_case.join("fine")).unwrap();

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, title) in ["Name", "Content", "broad_topics", "fine_topics"].iter().enumerate() {
            sheet.write_string(0, col as u16 + 1, *title).unwrap();
        }
        let docs = [
            ("vote.txt", "Polls open at eight.", 0.0, 3.0),
            ("match.txt", "The home team won.", 1.0, -1.0),
        ];
        for (i, (name, content, broad, fine)) in docs.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_number(row, 0, i as f64).unwrap();
            sheet.write_string(row, 1, *name).unwrap();
            sheet.write_string(row, 2, *content).unwrap();
            sheet.write_number(row, 3, *broad).unwrap();
            sheet.write_number(row, 4, *fine).unwrap();
        }
        workbook.save(use_case.join("data.xlsx")).unwrap();

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Topic").unwrap();
        sheet.write_string(0, 1, "Count").unwrap();
        sheet.write_string(0, 2, "Name").unwrap();
        for (i, (topic, name)) in [(-1.0, "-1_outliers"), (3.0, "3_election_polls")].iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_number(row, 0, *topic).unwrap();
            sheet.write_number(row, 1, 5.0).unwrap();
            sheet.write_string(row, 2, *name).unwrap();
        }
        workbook
            .save(use_case.join("fine").join("fine_excel.xlsx"))
            .unwrap();
    }

    #[test]
    fn test_overview_reads_tables() {
        let dir = tempdir().unwrap();
        write_news_fixture(dir.path());
        let artifacts = ClusterArtifacts::new(dir.path(), ["news"]);

        let overview = artifacts.overview("news", Granularity::Fine).unwrap();

        assert_eq!(
            overview.library,
            vec![
                LibraryRow {
                    name: "vote.txt".into(),
                    content: "Polls open at eight.".into(),
                },
                LibraryRow {
                    name: "match.txt".into(),
                    content: "The home team won.".into(),
                },
            ]
        );
        assert_eq!(
            overview.topics,
            vec![
                TopicRow {
                    topic: "-1".into(),
                    name: "-1_outliers".into(),
                },
                TopicRow {
                    topic: "3".into(),
                    name: "3_election_polls".into(),
                },
            ]
        );
        assert_eq!(
            overview.clustered_library[0],
            ClusteredRow {
                topic: "3".into(),
                name: "vote.txt".into(),
                content: "Polls open at eight.".into(),
            }
        );
        assert_eq!(overview.clustered_library[1].topic, "-1");
        assert_eq!(overview.artifacts.figures.len(), 3);
    }

    #[test]
    fn test_clustered_library_follows_granularity() {
        let dir = tempdir().unwrap();
        write_news_fixture(dir.path());
        let artifacts = ClusterArtifacts::new(dir.path(), Vec::<String>::new());

        let library = Sheet::open(&artifacts.library_table("news")).unwrap();
        let topics: Vec<_> = clustered_rows(&library, Granularity::Broad)
            .unwrap()
            .into_iter()
            .map(|row| row.topic)
            .collect();
        assert_eq!(topics, vec!["0", "1"]);

        // No broad topic table was exported.
        let err = artifacts.overview("news", Granularity::Broad).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
