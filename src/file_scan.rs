use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

fn netxml_matcher() -> GlobSet {
    let mut gs = GlobSetBuilder::new();
    let glob = GlobBuilder::new("*.netxml").case_insensitive(true).build().unwrap();
    gs.add(glob);
    gs.build().unwrap()
}

/// Resolve the command-line inputs into readable capture files. Paths that
/// cannot be resolved or are not regular files are reported and skipped; with
/// `dir_mode`, each directory is expanded through a non-recursive *.netxml
/// glob instead.
pub fn resolve_inputs(inputs: &[PathBuf], dir_mode: bool) -> Vec<PathBuf> {
    let set = netxml_matcher();
    let mut out: Vec<PathBuf> = Vec::new();
    for raw in inputs {
        let path = match raw.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Could not resolve {}: {}. It will be skipped.", raw.display(), e);
                continue;
            }
        };
        if dir_mode && path.is_dir() {
            collect_dir(&path, &set, &mut out);
        } else if !path.is_file() {
            let thing = if dir_mode { "directory" } else { "file" };
            log::warn!("{} is not a {}. Skipping...", raw.display(), thing);
        } else {
            out.push(path);
        }
    }
    out
}

fn collect_dir(dir: &Path, set: &GlobSet, out: &mut Vec<PathBuf>) {
    for de in WalkDir::new(dir)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let p = de.path();
        if p.is_file() && set.is_match(p) {
            out.push(p.to_path_buf());
        }
    }
}
