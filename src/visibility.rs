use std::borrow::Borrow;
use std::collections::BTreeSet;

use crate::scene_index::SceneIndex;

/// Sets the visible flag of every mesh named in `names`.
///
/// Names that are not in the scene are ignored. Returns how many meshes
/// actually changed state.
pub fn set_visibility<S>(index: &mut SceneIndex, names: &BTreeSet<S>, visible: bool) -> usize
where
    S: Borrow<str> + Ord,
{
    let mut changed = 0;
    for (_, node) in index.iter_mut() {
        if node.is_mesh() && node.visible != visible && names.contains(node.name.as_str()) {
            node.visible = visible;
            changed += 1;
        }
    }
    changed
}

/// Hides every mesh whose name starts with one of `prefixes`.
pub fn hide_prefixes<P: AsRef<str>>(index: &mut SceneIndex, prefixes: &[P]) -> usize {
    let names: BTreeSet<String> = prefixes
        .iter()
        .flat_map(|prefix| index.find_by_prefix(prefix.as_ref()))
        .collect();
    set_visibility(index, &names, false)
}

/// Makes every mesh visible again.
pub fn show_all(index: &mut SceneIndex) -> usize {
    let names = index.find_by_prefix("");
    set_visibility(index, &names, true)
}
