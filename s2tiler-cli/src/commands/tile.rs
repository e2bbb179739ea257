//! Tile command - build an index and print tiles as JSON.

use clap::Args;
use std::path::PathBuf;
use tracing::warn;

use s2tiler::{Projection, TileAddress, TileIndex, VectorTile};

use super::common::{write_output, IndexOverrides};
use crate::error::CliError;
use crate::runner::{build_index, CliRunner, GlobalOptions};

/// Arguments for the tile command.
#[derive(Debug, Args)]
pub struct TileArgs {
    /// Feature file (GeoJSON-style JSON, optionally .gz)
    pub input: PathBuf,

    /// Tiles to print: s2/<face>/<zoom>/<i>/<j>, wm/<zoom>/<x>/<y>, or a raw id
    #[arg(required = true)]
    pub addresses: Vec<String>,

    /// Write the tiles to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print each tile
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub index: IndexOverrides,
}

/// Run the tile command.
pub fn run(options: &GlobalOptions, args: TileArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("tile");

    let config = args.index.apply(runner.config().index.clone());
    let addresses = parse_addresses(&args.addresses, config.projection)?;
    let mut index = build_index(&args.input, config)?;

    let (content, found) = render_tiles(&mut index, &addresses, args.pretty)?;
    write_output(args.output.as_deref(), &content)?;

    eprintln!("{} of {} tiles found", found, addresses.len());
    Ok(())
}

/// Parses every address up front so a typo fails before the index is built.
fn parse_addresses(texts: &[String], projection: Projection) -> Result<Vec<TileAddress>, CliError> {
    texts
        .iter()
        .map(|text| {
            let address = TileAddress::parse(text, projection).map_err(|e| CliError::InvalidAddress {
                text: text.clone(),
                reason: e.to_string(),
            })?;
            if address.projection != projection {
                return Err(CliError::InvalidAddress {
                    text: text.clone(),
                    reason: format!("the index uses the {} projection", projection),
                });
            }
            Ok(address)
        })
        .collect()
}

/// One JSON document per line (or per block when pretty). Missing tiles are
/// reported on stderr and skipped.
fn render_tiles(index: &mut TileIndex, addresses: &[TileAddress], pretty: bool) -> Result<(String, usize), CliError> {
    let mut content = String::new();
    let mut found = 0;
    for address in addresses {
        match index.get_tile(address.id()) {
            Some(tile) => {
                content.push_str(&to_json(tile, pretty)?);
                content.push('\n');
                found += 1;
            }
            None => {
                warn!(tile = %address, "Tile not found");
                eprintln!("No tile at {}", address);
            }
        }
    }
    Ok((content, found))
}

fn to_json(tile: &VectorTile, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(tile)?
    } else {
        serde_json::to_string(tile)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use s2tiler::geometry::{GeometryInput, SourceFeature};
    use s2tiler::{SourceCollection, TileIndexConfig};

    fn origin_index(projection: Projection) -> TileIndex {
        let collection: SourceCollection = [SourceFeature::lon_lat(GeometryInput::Point(vec![0.0, 0.0]))]
            .into_iter()
            .collect();
        TileIndex::new(&collection, TileIndexConfig::default().with_projection(projection)).unwrap()
    }

    #[test]
    fn test_parse_addresses_rejects_other_projection() {
        let texts = vec!["s2/0/0/0/0".to_string(), "wm/1/0/0".to_string()];
        let err = parse_addresses(&texts, Projection::S2).unwrap_err();
        assert!(err.to_string().contains("wm/1/0/0"));
    }

    #[test]
    fn test_parse_addresses_reports_bad_text() {
        let texts = vec!["s2/0/x/0/0".to_string()];
        assert!(matches!(
            parse_addresses(&texts, Projection::S2),
            Err(CliError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_render_skips_missing_tiles() {
        let mut index = origin_index(Projection::S2);
        let texts = vec!["s2/0/0/0/0".to_string(), "s2/4/0/0/0".to_string()];
        let addresses = parse_addresses(&texts, Projection::S2).unwrap();

        let (content, found) = render_tiles(&mut index, &addresses, false).unwrap();
        assert_eq!(found, 1);
        assert_eq!(content.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(value["layers"]["default"]["features"][0]["geometry"][0][0], 4096);
    }

    #[test]
    fn test_render_web_mercator_root() {
        let mut index = origin_index(Projection::WebMercator);
        let addresses = parse_addresses(&["wm/0/0/0".to_string()], Projection::WebMercator).unwrap();
        let (content, found) = render_tiles(&mut index, &addresses, true).unwrap();
        assert_eq!(found, 1);
        assert!(content.contains("\"extent\": 8192"));
    }
}
