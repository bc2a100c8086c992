use std::io::Write;

use crate::error::Result;
use crate::filter::Listing;

/// Write one listing as `<hex>\t<name>\n`
pub fn show<W: Write>(output: &mut W, listing: &Listing<'_>) -> Result<()> {
    writeln!(output, "{}\t{}", listing.object_id, listing.name)?;
    Ok(())
}

/// Write every listing, returning how many lines were written
pub fn show_all<'a, W, I>(output: &mut W, listings: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = Listing<'a>>,
{
    let mut count = 0;
    for listing in listings {
        show(output, &listing)?;
        count += 1;
    }
    Ok(count)
}
