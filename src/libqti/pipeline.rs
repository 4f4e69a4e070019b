use crate::libqti::csv_dump::write_csv;
use crate::libqti::error::{Error, Result};
use crate::libqti::manifest::{resolve_resources, ResourceHrefs, MANIFEST_FILE};
use crate::libqti::question::{read_questions, QuizMetadata};
use crate::libqti::stripper::strip_namespaces;
use crate::libqti::writer::write_quiz;
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipArchive;

pub const DEFAULT_CSV_FILE: &str = "question_details.csv";
pub const ASSESSMENT_META_FILE: &str = "assessment_meta.xml";
const HEADER_SCRATCH: &str = "output.xml";
const QUESTIONS_SCRATCH: &str = "stripped.xml";

/// Where the quiz export comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A `.zip` as downloaded from Canvas.
    Archive(PathBuf),
    /// An export that has already been unpacked.
    Folder(PathBuf),
}

impl Source {
    pub fn detect(path: &Path) -> Result<Source> {
        if path.is_file() {
            Ok(Source::Archive(path.to_path_buf()))
        } else if path.is_dir() {
            Ok(Source::Folder(path.to_path_buf()))
        } else {
            Err(Error::InputNotFound(path.to_path_buf()))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Source::Archive(path) | Source::Folder(path) => path,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    pub out_dir: PathBuf,
    pub work_dir: PathBuf,
    pub csv_file: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            out_dir: PathBuf::from("."),
            work_dir: PathBuf::from("."),
            csv_file: PathBuf::from(DEFAULT_CSV_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub quiz_file: Option<PathBuf>,
    pub csv_file: Option<PathBuf>,
    pub questions: usize,
}

/// Stripped copies of the two QTI files, removed again when the run ends.
struct ScratchFiles {
    header: PathBuf,
    questions: PathBuf,
}

impl ScratchFiles {
    fn new(work_dir: &Path) -> Self {
        ScratchFiles {
            header: work_dir.join(HEADER_SCRATCH),
            questions: work_dir.join(QUESTIONS_SCRATCH),
        }
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in [&self.header, &self.questions] {
            match fs::remove_file(path) {
                Ok(()) => debug!("[Cleanup] Removed {:?}", path),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!("[Cleanup] {:?} was already gone", path)
                }
                Err(e) => warn!("[Cleanup] Cannot remove {:?}: {}", path, e),
            }
        }
    }
}

pub fn run(source: &Source, options: &Options) -> Result<Outcome> {
    let unpacked: TempDir;
    let root = match source {
        Source::Archive(archive) => {
            unpacked = TempDir::new()?;
            info!("[Setup] Created temporary directory at {:?}", unpacked.path());
            unpack(archive, unpacked.path())?;
            unpacked.path()
        }
        Source::Folder(folder) => folder.as_path(),
    };

    let hrefs = locate_resources(root)?;
    info!("[Setup] Header: {}, questions: {}", hrefs.header, hrefs.questions);

    let scratch = ScratchFiles::new(&options.work_dir);
    strip_namespaces(&root.join(&hrefs.header), &scratch.header)?;
    strip_namespaces(&root.join(&hrefs.questions), &scratch.questions)?;

    let meta = QuizMetadata::read(&scratch.header)?;
    let questions = read_questions(&scratch.questions)?;

    let quiz_file = match write_quiz(&meta, &questions, &options.out_dir) {
        Ok(path) => Some(path),
        Err(Error::MissingTitle) => {
            warn!("[Writer] The quiz needs a title, no quiz file written");
            None
        }
        Err(e) => return Err(e),
    };
    let csv_file = write_csv(&options.csv_file, &questions)?.then(|| options.csv_file.clone());

    Ok(Outcome {
        quiz_file,
        csv_file,
        questions: questions.len(),
    })
}

fn unpack(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file)?;
    debug!("[Setup] Unpacking {} entries from {:?}", zip.len(), archive);
    zip.extract(dest)?;
    Ok(())
}

/// Resolves the header and question files through the manifest, or, for a bare
/// folder without one, picks `assessment_meta.xml` plus the other XML file.
fn locate_resources(root: &Path) -> Result<ResourceHrefs> {
    let manifest = root.join(MANIFEST_FILE);
    if manifest.is_file() {
        return resolve_resources(&manifest);
    }

    debug!("[Setup] No {MANIFEST_FILE} in {:?}, looking for known files", root);
    if !root.join(ASSESSMENT_META_FILE).is_file() {
        return Err(Error::ManifestShape(format!(
            "no {MANIFEST_FILE} and no {ASSESSMENT_META_FILE} in {:?}",
            root
        )));
    }
    let mut candidates: Vec<String> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".xml") && name != ASSESSMENT_META_FILE)
        .collect();
    candidates.sort();
    let questions = candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::ManifestShape(format!("no question file next to {ASSESSMENT_META_FILE}")))?;

    Ok(ResourceHrefs {
        header: ASSESSMENT_META_FILE.to_string(),
        questions,
    })
}
