//! Selection of advertised refs for display

use crate::pattern::Patterns;
use crate::refs::{ObjectId, Ref};

/// Suffix git uses to name the peeled target of a tag
pub const PEELED_SUFFIX: &str = "^{}";

/// One line of output: an object id and the name to show it under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<'a> {
    pub object_id: &'a ObjectId,
    pub name: String,
}

/// Lazily yields listings for every ref accepted by `patterns`,
/// in advertisement order. A peeled tag yields its own line followed
/// by a `^{}` line for the peeled target.
pub fn filter_refs<'a>(
    refs: &'a [Ref],
    patterns: &'a Patterns,
) -> impl Iterator<Item = Listing<'a>> + 'a {
    refs.iter()
        .filter(move |r| patterns.matches(&r.name))
        .flat_map(|r| {
            let primary = Listing {
                object_id: &r.object_id,
                name: r.name.clone(),
            };
            let peeled = r.peeled.as_ref().map(|p| Listing {
                object_id: p,
                name: format!("{}{}", r.name, PEELED_SUFFIX),
            });
            std::iter::once(primary).chain(peeled)
        })
}
