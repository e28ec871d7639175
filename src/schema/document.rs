/**
 * Schema Document Model
 *
 * Contributed schema fragments are parsed into a flat list of top-level
 * blocks by brace matching, merged programmatically, and serialized once at
 * the end of composition. Inserting fields into an existing type appends to
 * that type's body structurally; there is no textual splicing against the
 * serialized schema.
 */

use crate::error::ServerError;

/// One top-level schema definition
///
/// `body` is present for braced definitions (`type`, `schema`, `enum`, ...)
/// and absent for single-line ones (`scalar JSON`, `union U = A | B`).
#[derive(Clone, Debug, PartialEq)]
struct Block {
    header: String,
    body: Option<Vec<String>>,
}

const KIND_KEYWORDS: [&str; 5] = ["type", "interface", "input", "enum", "extend"];

impl Block {
    /// Name of the defined type, if the header declares one
    fn type_name(&self) -> Option<&str> {
        let mut tokens = self.header.split_whitespace();
        let kind = tokens.next()?;
        if KIND_KEYWORDS.contains(&kind) {
            tokens.next()
        } else {
            None
        }
    }
}

/// The merged schema under construction
#[derive(Clone, Debug, Default)]
pub struct SchemaDocument {
    blocks: Vec<Block>,
}

fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn body_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_blocks(text: &str) -> Result<Vec<Block>, ServerError> {
    let mut blocks = Vec::new();
    let mut header = String::new();
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                let mut depth = 1;
                let mut body = String::new();
                for inner in chars.by_ref() {
                    match inner {
                        '{' => {
                            depth += 1;
                            body.push(inner);
                        }
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            body.push(inner);
                        }
                        _ => body.push(inner),
                    }
                }
                if depth != 0 {
                    return Err(ServerError::composition(
                        "unbalanced braces in schema fragment",
                    ));
                }
                if header.trim().is_empty() {
                    return Err(ServerError::composition(
                        "schema block without a definition header",
                    ));
                }
                blocks.push(Block {
                    header: normalize_ws(&header),
                    body: Some(body_lines(&body)),
                });
                header.clear();
            }
            '\n' => {
                if !header.trim().is_empty() {
                    blocks.push(Block {
                        header: normalize_ws(&header),
                        body: None,
                    });
                }
                header.clear();
            }
            _ => header.push(c),
        }
    }
    if !header.trim().is_empty() {
        blocks.push(Block {
            header: normalize_ws(&header),
            body: None,
        });
    }
    Ok(blocks)
}

impl SchemaDocument {
    /// The minimal starting schema: an empty root query/mutation type
    pub fn minimal_root() -> Self {
        Self {
            blocks: vec![
                Block {
                    header: "schema".to_string(),
                    body: Some(vec!["query: Root".to_string(), "mutation: Root".to_string()]),
                },
                Block {
                    header: "type Root".to_string(),
                    body: Some(Vec::new()),
                },
            ],
        }
    }

    /// Parse a fragment and append its definitions at the top level
    pub fn add_top_level(&mut self, fragment: &str) -> Result<(), ServerError> {
        self.blocks.extend(parse_blocks(fragment)?);
        Ok(())
    }

    /// Append a fragment's field declarations to an existing type's body
    pub fn append_to_type(&mut self, type_name: &str, fragment: &str) -> Result<(), ServerError> {
        let body = self
            .blocks
            .iter_mut()
            .filter(|b| b.type_name() == Some(type_name))
            .find_map(|b| b.body.as_mut())
            .ok_or_else(|| ServerError::composition(format!("schema for {type_name} not found")))?;
        body.extend(body_lines(fragment));
        Ok(())
    }

    /// Whether a braced definition with this name exists
    pub fn has_type(&self, type_name: &str) -> bool {
        self.blocks
            .iter()
            .any(|b| b.type_name() == Some(type_name))
    }

    /// Serialize the merged document to SDL text
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match &block.body {
                Some(body) => {
                    out.push_str(&block.header);
                    out.push_str(" {\n");
                    for line in body {
                        out.push_str("    ");
                        out.push_str(line);
                        out.push('\n');
                    }
                    out.push_str("}\n\n");
                }
                None => {
                    out.push_str(&block.header);
                    out.push_str("\n\n");
                }
            }
        }
        out
    }
}
