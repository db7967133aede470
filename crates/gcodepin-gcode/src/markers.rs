//! Textual markers recognized in slicer output

/// Comment preceding every layer change
pub const LAYER_CHANGE: &str = "LAYER_CHANGE";

/// Markers before which the pinning header is inserted, first match wins
pub const HEADER_MARKERS: [&str; 3] = [
    "EXECUTABLE_BLOCK_START",
    "THUMBNAIL_BLOCK_START",
    "thumbnail begin",
];

/// End of the executable program
pub const PROGRAM_END: &str = "EXECUTABLE_BLOCK_END";

/// Object start marker, informational only
pub const OBJECT_MARKER: &str = "printing object";

/// Title comment of the inserted constants block
pub const HEADER_TITLE: &str = "HEADER PINNING PARAMETERS";

/// First comment of every generated layer block
pub fn pinning_layer_title(layer: u32) -> String {
    format!("--- PINNING LAYER {} ---", layer)
}
