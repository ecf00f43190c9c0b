use anyhow::{Context, Result};
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    fs::create_dir_all(path.as_ref()).with_context(|| format!("create_dir_all {}", path.as_ref().display()))
}

/// Regular files under `path`, sorted so map input order is reproducible.
pub fn list_files_recursive(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(path.as_ref()) {
        let entry = entry.with_context(|| format!("walk {}", path.as_ref().display()))?;
        if entry.file_type().is_file() {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

pub fn read_lines(path: impl AsRef<Path>) -> Result<impl Iterator<Item = io::Result<String>>> {
    let file = File::open(path.as_ref()).with_context(|| format!("open {}", path.as_ref().display()))?;
    Ok(BufReader::new(file).lines())
}

pub fn open_writer(path: impl AsRef<Path>) -> Result<BufWriter<File>> {
    if let Some(parent) = path.as_ref().parent() {
        ensure_dir(parent)?;
    }
    let file = File::create(path.as_ref()).with_context(|| format!("create {}", path.as_ref().display()))?;
    Ok(BufWriter::new(file))
}

// ========== Output sinks ==========

/// Output collaborator for reducer records. `finish` commits everything written so far.
pub trait Sink<T> {
    fn write(&mut self, record: &T) -> io::Result<()>;
    fn finish(&mut self) -> io::Result<()>;
}

/// Writes one `Display` line per record. Lines go to `<path>.tmp`, which `finish`
/// renames onto `path`; a sink that is never finished leaves `path` untouched.
pub struct TextLineSink {
    path: PathBuf,
    tmp_path: PathBuf,
    writer: Option<BufWriter<File>>,
    lines: u64,
}

impl TextLineSink {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);
        let writer = open_writer(&tmp_path)?;
        Ok(Self { path, tmp_path, writer: Some(writer), lines: 0 })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    /// Drops buffered output and removes the temporary file.
    pub fn abort(mut self) {
        self.writer.take();
        let _ = fs::remove_file(&self.tmp_path);
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "sink already finished"))
    }
}

impl<T: Display> Sink<T> for TextLineSink {
    fn write(&mut self, record: &T) -> io::Result<()> {
        writeln!(self.writer()?, "{}", record)?;
        self.lines += 1;
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        let mut writer = match self.writer.take() {
            Some(w) => w,
            None => return Ok(()),
        };
        writer.flush()?;
        drop(writer);
        fs::rename(&self.tmp_path, &self.path)
    }
}

/// In-memory sink, mostly for callers that post-process records themselves.
#[derive(Debug)]
pub struct VecSink<T> {
    pub records: Vec<T>,
    pub finished: bool,
}

impl<T> Default for VecSink<T> {
    fn default() -> Self {
        Self { records: Vec::new(), finished: false }
    }
}

impl<T: Clone> Sink<T> for VecSink<T> {
    fn write(&mut self, record: &T) -> io::Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_sink_commits_on_finish_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/part-00000.tsv");
        let mut sink = TextLineSink::create(&path).unwrap();
        Sink::<&str>::write(&mut sink, &"\"cat\"\t[meow]").unwrap();
        assert!(!path.exists());
        Sink::<&str>::finish(&mut sink).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "\"cat\"\t[meow]\n");
        assert_eq!(sink.lines_written(), 1);
        assert!(!dir.path().join("out/part-00000.tsv.tmp").exists());
    }

    #[test]
    fn aborted_sink_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part-00000.tsv");
        let mut sink = TextLineSink::create(&path).unwrap();
        Sink::<&str>::write(&mut sink, &"line").unwrap();
        sink.abort();
        assert!(!path.exists());
        assert!(!dir.path().join("part-00000.tsv.tmp").exists());
    }

    #[test]
    fn lists_nested_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/two.txt"), "2").unwrap();
        fs::write(dir.path().join("a.txt"), "1").unwrap();
        let files = list_files_recursive(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("a.txt"), dir.path().join("b/two.txt")]);
    }
}
