//! `md3kit dump`

use std::path::Path;

use anyhow::Context;

use crate::diagnostics::TracingSink;
use crate::formats::md3::parse_md3_bytes_with;

/// Write the decoded model as pretty-printed JSON.
pub fn execute(path: &Path, output: Option<&Path>, lenient: bool) -> anyhow::Result<()> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let model = parse_md3_bytes_with(&data, &super::read_options(lenient), &mut TracingSink)
        .with_context(|| format!("decoding {}", path.display()))?;
    model.log_summary();

    let json = model.to_json()?;
    match output {
        Some(out) => {
            std::fs::write(out, json).with_context(|| format!("writing {}", out.display()))?;
            println!("Wrote {}", out.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
