//! Which filesystem notifications count as a new screenshot.

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind};
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Lowercased fragments that mark a screenshot file name. Covers the
/// macOS defaults ("Screenshot …", "Screen Shot …") and CleanShot.
const NAME_MARKERS: &[&str] = &["screenshot", "screen shot", "cleanshot"];

/// Does this file name look like a screenshot image?
///
/// Hidden names are rejected: macOS writes `.Screenshot …` first and renames
/// it into place, and only the final name should be reported.
pub fn is_screenshot_name(name: &str) -> bool {
    if name.starts_with('.') {
        return false;
    }
    let lower = name.to_lowercase();
    let has_image_ext = Path::new(&lower)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext));
    has_image_ext && NAME_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Does this path's file name look like a screenshot image?
pub fn is_screenshot_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(is_screenshot_name)
}

/// Extract screenshot paths from a raw notify event.
///
/// Creations and the destination side of renames count. Everything else
/// (modifications, removals, access, folder creation) is ignored.
pub fn screenshot_paths(event: &Event) -> Vec<PathBuf> {
    let candidates: &[PathBuf] = match event.kind {
        EventKind::Create(CreateKind::Folder) => return Vec::new(),
        EventKind::Create(_) => &event.paths,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => &event.paths,
        // paths = [from, to]
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.get(1..).unwrap_or(&[])
        }
        // FSEvents cannot tell the two sides apart; only the side that
        // still exists is the destination.
        EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => {
            return event
                .paths
                .iter()
                .filter(|path| is_screenshot_path(path) && path.is_file())
                .cloned()
                .collect();
        }
        _ => return Vec::new(),
    };

    candidates
        .iter()
        .filter(|path| is_screenshot_path(path))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, DataChange, RemoveKind};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |ev, p| ev.add_path(PathBuf::from(p)))
    }

    #[test]
    fn accepts_macos_and_cleanshot_names() {
        for name in [
            "Screenshot 2024-05-01 at 10.00.00.png",
            "Screen Shot 2020-01-01 at 9.41.12 AM.png",
            "CleanShot 2024-05-01 at 10.00.00@2x.png",
            "my-screenshot.JPG",
            "screenshot.jpeg",
        ] {
            assert!(is_screenshot_name(name), "{name} should match");
        }
    }

    #[test]
    fn rejects_other_files() {
        for name in [
            "Screenshot 2024-05-01 at 10.00.00.mov",
            "holiday.png",
            "Screenshot notes.txt",
            ".Screenshot 2024-05-01 at 10.00.00.png",
            "screenshot",
            "Screenshot 2024-05-01 at 10.00.00_summary.txt",
        ] {
            assert!(!is_screenshot_name(name), "{name} should not match");
        }
    }

    #[test]
    fn create_events_yield_matching_paths_only() {
        let ev = event(
            EventKind::Create(CreateKind::File),
            &["/d/Screenshot 1.png", "/d/notes.png"],
        );
        assert_eq!(screenshot_paths(&ev), vec![PathBuf::from("/d/Screenshot 1.png")]);
    }

    #[test]
    fn rename_both_uses_destination() {
        let ev = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/d/.Screenshot 1.png", "/d/Screenshot 1.png"],
        );
        assert_eq!(screenshot_paths(&ev), vec![PathBuf::from("/d/Screenshot 1.png")]);
    }

    #[test]
    fn rename_from_and_non_creation_events_are_ignored() {
        for kind in [
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            EventKind::Modify(ModifyKind::Data(DataChange::Any)),
            EventKind::Remove(RemoveKind::File),
            EventKind::Access(AccessKind::Any),
            EventKind::Create(CreateKind::Folder),
        ] {
            let ev = event(kind, &["/d/Screenshot 1.png"]);
            assert!(screenshot_paths(&ev).is_empty(), "{:?} should be ignored", ev.kind);
        }
    }
}
