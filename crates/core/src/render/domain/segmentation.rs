use std::ops::Range;
use std::path::{Path, PathBuf};

use super::timeline_source::TrackLayout;
use crate::shared::constants::SEGMENT_SEPARATOR;
use crate::shared::time::Pts;

/// One interval between two consecutive cuts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// 1-based position among all intervals, dropped ones included.
    pub number: usize,
    pub range: Range<Pts>,
    pub has_content: bool,
}

/// One output file a render request turns into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedOutput {
    pub path: PathBuf,
    pub range: Range<Pts>,
}

/// Sorted, distinct boundary positions of all enabled tracks within `bounds`,
/// including both ends of `bounds`.
pub fn cut_positions(tracks: &[TrackLayout], bounds: &Range<Pts>) -> Vec<Pts> {
    let mut cuts: Vec<Pts> = tracks
        .iter()
        .filter(|t| t.enabled)
        .flat_map(|t| t.clips.iter().flat_map(|c| [c.start, c.end]))
        .filter(|p| bounds.contains(p))
        .chain([bounds.start, bounds.end])
        .collect();
    cuts.sort_unstable();
    cuts.dedup();
    cuts
}

/// Splits `bounds` into consecutive half-open intervals at every cut.
pub fn partition(tracks: &[TrackLayout], bounds: &Range<Pts>) -> Vec<Segment> {
    cut_positions(tracks, bounds)
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let range = pair[0]..pair[1];
            Segment {
                number: i + 1,
                has_content: has_content(tracks, &range),
                range,
            }
        })
        .collect()
}

fn has_content(tracks: &[TrackLayout], range: &Range<Pts>) -> bool {
    tracks.iter().filter(|t| t.enabled).any(|t| {
        t.clips
            .iter()
            .any(|c| !c.gap && c.start < range.end && c.end > range.start)
    })
}

/// `dir/name.ext` becomes `dir/name_<number>.ext`.
pub fn numbered_file_name(path: &Path, number: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{stem}{SEGMENT_SEPARATOR}{number}");
    if let Some(ext) = path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    path.with_file_name(name)
}

/// Output files for a render of `bounds`: one file, or with `separate_at_cuts`
/// one numbered file per interval that holds any content. Numbers follow the
/// interval's position, so dropped intervals leave holes.
pub fn plan(
    output: &Path,
    bounds: Range<Pts>,
    tracks: &[TrackLayout],
    separate_at_cuts: bool,
) -> Vec<PlannedOutput> {
    if !separate_at_cuts {
        return vec![PlannedOutput {
            path: output.to_path_buf(),
            range: bounds,
        }];
    }
    partition(tracks, &bounds)
        .into_iter()
        .filter(|segment| {
            if !segment.has_content {
                log::info!(
                    "Skipping empty segment {} [{}, {})",
                    segment.number,
                    segment.range.start,
                    segment.range.end
                );
            }
            segment.has_content
        })
        .map(|segment| PlannedOutput {
            path: numbered_file_name(output, segment.number),
            range: segment.range,
        })
        .collect()
}
