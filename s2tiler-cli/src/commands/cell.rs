//! Cell commands - inspect S2 cell ids.

use clap::Subcommand;

use s2tiler::coord::MAX_LEVEL;
use s2tiler::{CellError, CellId, LonLat};

use crate::error::CliError;

/// Cell action subcommands.
#[derive(Debug, Subcommand)]
pub enum CellAction {
    /// Show the cell containing a longitude/latitude
    Lonlat {
        /// Longitude in decimal degrees
        #[arg(allow_negative_numbers = true)]
        lon: f64,

        /// Latitude in decimal degrees
        #[arg(allow_negative_numbers = true)]
        lat: f64,

        /// Cell level (0-30)
        #[arg(long, default_value_t = MAX_LEVEL)]
        level: u8,
    },
    /// Show details for a cell id (decimal, 0x-hex or token)
    Inspect {
        /// Cell id or token
        id: String,
    },
}

/// Run a cell subcommand.
pub fn run(action: CellAction) -> Result<(), CliError> {
    let cell = match action {
        CellAction::Lonlat { lon, lat, level } => {
            if level > MAX_LEVEL {
                return Err(CliError::InvalidCell {
                    text: level.to_string(),
                    error: CellError::InvalidLevel(level),
                });
            }
            CellId::from_lon_lat(LonLat::new(lon, lat)).parent_at(level)
        }
        CellAction::Inspect { id } => parse_cell(&id)?,
    };

    for (label, value) in describe(cell) {
        println!("{:<10} {}", format!("{}:", label), value);
    }
    Ok(())
}

/// Accepts a decimal id, a `0x` hex id or a token.
fn parse_cell(text: &str) -> Result<CellId, CliError> {
    let text = text.trim();
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map_err(|_| CellError::InvalidToken(text.to_string()))
            .and_then(CellId::try_from_raw)
    } else if text.len() > 16 && text.bytes().all(|b| b.is_ascii_digit()) {
        // too long for a token, so it can only be a decimal id
        text.parse::<u64>()
            .map_err(|_| CellError::InvalidToken(text.to_string()))
            .and_then(CellId::try_from_raw)
    } else {
        CellId::from_token(text)
    };
    parsed.map_err(|error| CliError::InvalidCell {
        text: text.to_string(),
        error,
    })
}

fn tokens(cells: &[CellId]) -> String {
    cells.iter().map(|c| c.to_token()).collect::<Vec<_>>().join(" ")
}

/// Labelled lines describing `cell`.
fn describe(cell: CellId) -> Vec<(&'static str, String)> {
    let (face, zoom, i, j) = cell.to_face_zoom_ij();
    let center = cell.to_lon_lat();
    let (min, max) = cell.range();

    vec![
        ("id", cell.raw().to_string()),
        ("token", cell.to_token()),
        ("face", face.to_string()),
        ("level", zoom.to_string()),
        ("tile", format!("s2/{}/{}/{}/{}", face, zoom, i, j)),
        ("center", format!("{:.6}, {:.6}", center.lon, center.lat)),
        ("range", format!("{} .. {}", min.to_token(), max.to_token())),
        (
            "parent",
            cell.parent().map_or_else(|| "-".to_string(), CellId::to_token),
        ),
        (
            "children",
            if cell.is_leaf() {
                "-".to_string()
            } else {
                tokens(&cell.children())
            },
        ),
        ("neighbors", tokens(&cell.neighbors())),
    ]
}
