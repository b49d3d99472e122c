//! Package part lookup tables: content types, styles, numbering, and
//! relationships.
//!
//! These are straight dictionaries parsed from their parts; all the
//! interesting behavior lives in the body reader and the conversion
//! engine.

use std::collections::HashMap;

use crate::document::NumberingLevel;
use crate::error::Result;

use super::xml;

/// `[Content_Types].xml`: extension defaults plus per-part overrides.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    pub fn parse(source: &str) -> Result<Self> {
        let root = xml::parse(source)?;
        let mut defaults = HashMap::new();
        let mut overrides = HashMap::new();

        for child in root.elements() {
            match child.name.as_str() {
                "Default" => {
                    if let (Some(extension), Some(content_type)) =
                        (child.attr("Extension"), child.attr("ContentType"))
                    {
                        defaults.insert(extension.to_ascii_lowercase(), content_type.to_string());
                    }
                }
                "Override" => {
                    if let (Some(part_name), Some(content_type)) =
                        (child.attr("PartName"), child.attr("ContentType"))
                    {
                        overrides.insert(part_name.to_string(), content_type.to_string());
                    }
                }
                _ => {}
            }
        }

        Ok(Self {
            defaults,
            overrides,
        })
    }

    /// Content type for a part path, falling back to well-known image
    /// extensions when the package does not declare one.
    pub fn content_type(&self, path: &str) -> Option<String> {
        if let Some(content_type) = self.overrides.get(&format!("/{path}")) {
            return Some(content_type.clone());
        }
        let extension = path.rsplit('.').next()?.to_ascii_lowercase();
        if let Some(content_type) = self.defaults.get(&extension) {
            return Some(content_type.clone());
        }
        let fallback = match extension.as_str() {
            "png" => "image/png",
            "gif" => "image/gif",
            "jpeg" | "jpg" => "image/jpeg",
            "bmp" => "image/bmp",
            "tif" | "tiff" => "image/tiff",
            _ => return None,
        };
        Some(fallback.to_string())
    }
}

/// Style definitions, mapping style ids to display names per style type.
#[derive(Debug, Clone, Default)]
pub struct Styles {
    paragraph: HashMap<String, String>,
    character: HashMap<String, String>,
    table: HashMap<String, String>,
}

impl Styles {
    pub fn parse(source: &str) -> Result<Self> {
        let root = xml::parse(source)?;
        let mut styles = Self::default();

        for style in root.children_named("w:style") {
            let Some(style_id) = style.attr("w:styleId") else {
                continue;
            };
            let Some(name) = style.find("w:name").and_then(|name| name.attr("w:val")) else {
                continue;
            };
            let table = match style.attr("w:type") {
                Some("paragraph") => &mut styles.paragraph,
                Some("character") => &mut styles.character,
                Some("table") => &mut styles.table,
                _ => continue,
            };
            table.insert(style_id.to_string(), name.to_string());
        }

        Ok(styles)
    }

    pub fn paragraph_style_name(&self, style_id: &str) -> Option<&str> {
        self.paragraph.get(style_id).map(String::as_str)
    }

    pub fn character_style_name(&self, style_id: &str) -> Option<&str> {
        self.character.get(style_id).map(String::as_str)
    }

    pub fn table_style_name(&self, style_id: &str) -> Option<&str> {
        self.table.get(style_id).map(String::as_str)
    }
}

/// Numbering definitions: (numId, level) to list format.
#[derive(Debug, Clone, Default)]
pub struct Numbering {
    /// numId -> abstractNumId
    nums: HashMap<String, String>,
    /// (abstractNumId, level) -> ordered-ness
    levels: HashMap<(String, String), bool>,
}

impl Numbering {
    pub fn parse(source: &str) -> Result<Self> {
        let root = xml::parse(source)?;
        let mut numbering = Self::default();

        for abstract_num in root.children_named("w:abstractNum") {
            let Some(abstract_id) = abstract_num.attr("w:abstractNumId") else {
                continue;
            };
            for level in abstract_num.children_named("w:lvl") {
                let Some(level_index) = level.attr("w:ilvl") else {
                    continue;
                };
                let format = level
                    .find("w:numFmt")
                    .and_then(|format| format.attr("w:val"))
                    .unwrap_or("decimal");
                numbering.levels.insert(
                    (abstract_id.to_string(), level_index.to_string()),
                    format != "bullet",
                );
            }
        }

        for num in root.children_named("w:num") {
            let Some(num_id) = num.attr("w:numId") else {
                continue;
            };
            if let Some(abstract_id) = num
                .find("w:abstractNumId")
                .and_then(|element| element.attr("w:val"))
            {
                numbering
                    .nums
                    .insert(num_id.to_string(), abstract_id.to_string());
            }
        }

        Ok(numbering)
    }

    pub fn find_level(&self, num_id: &str, level: &str) -> Option<NumberingLevel> {
        let abstract_id = self.nums.get(num_id)?;
        let is_ordered = *self.levels.get(&(abstract_id.clone(), level.to_string()))?;
        Some(NumberingLevel {
            level_index: level.parse().ok()?,
            is_ordered,
        })
    }
}

/// Relationship target, by id.
#[derive(Debug, Clone)]
pub struct Relationship {
    pub target: String,
    pub is_external: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Relationships {
    targets: HashMap<String, Relationship>,
}

impl Relationships {
    pub fn parse(source: &str) -> Result<Self> {
        let root = xml::parse(source)?;
        let mut targets = HashMap::new();

        for relationship in root.children_named("Relationship") {
            let (Some(id), Some(target)) = (relationship.attr("Id"), relationship.attr("Target"))
            else {
                continue;
            };
            targets.insert(
                id.to_string(),
                Relationship {
                    target: target.to_string(),
                    is_external: relationship.attr("TargetMode") == Some("External"),
                },
            );
        }

        Ok(Self { targets })
    }

    pub fn target(&self, id: &str) -> Option<&Relationship> {
        self.targets.get(id)
    }

    /// Target of the first relationship whose type ends with the given
    /// suffix (used to locate the main document part).
    pub fn target_by_type_suffix(source: &str, suffix: &str) -> Result<Option<String>> {
        let root = xml::parse(source)?;
        for relationship in root.children_named("Relationship") {
            if relationship
                .attr("Type")
                .is_some_and(|relationship_type| relationship_type.ends_with(suffix))
                && let Some(target) = relationship.attr("Target")
            {
                return Ok(Some(target.to_string()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types_overrides_beat_defaults() {
        let content_types = ContentTypes::parse(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
                <Default Extension="png" ContentType="image/png"/>
                <Override PartName="/word/media/special.png" ContentType="image/x-special"/>
            </Types>"#,
        )
        .expect("parses");

        assert_eq!(
            content_types.content_type("word/media/special.png").as_deref(),
            Some("image/x-special")
        );
        assert_eq!(
            content_types.content_type("word/media/other.png").as_deref(),
            Some("image/png")
        );
    }

    #[test]
    fn test_content_types_fall_back_to_known_image_extensions() {
        let content_types = ContentTypes::default();
        assert_eq!(
            content_types.content_type("word/media/image1.jpg").as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(content_types.content_type("word/media/image1.xyz"), None);
    }

    #[test]
    fn test_styles_lookup_by_type() {
        let styles = Styles::parse(
            r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
                <w:style w:type="paragraph" w:styleId="Heading1">
                    <w:name w:val="Heading 1"/>
                </w:style>
                <w:style w:type="character" w:styleId="Emphasis">
                    <w:name w:val="Emphasis"/>
                </w:style>
            </w:styles>"#,
        )
        .expect("parses");

        assert_eq!(styles.paragraph_style_name("Heading1"), Some("Heading 1"));
        assert_eq!(styles.character_style_name("Emphasis"), Some("Emphasis"));
        assert_eq!(styles.paragraph_style_name("Emphasis"), None);
    }

    #[test]
    fn test_numbering_resolves_through_num_indirection() {
        let numbering = Numbering::parse(
            r#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
                <w:abstractNum w:abstractNumId="7">
                    <w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/></w:lvl>
                    <w:lvl w:ilvl="1"><w:numFmt w:val="decimal"/></w:lvl>
                </w:abstractNum>
                <w:num w:numId="42"><w:abstractNumId w:val="7"/></w:num>
            </w:numbering>"#,
        )
        .expect("parses");

        assert_eq!(
            numbering.find_level("42", "0"),
            Some(NumberingLevel {
                level_index: 0,
                is_ordered: false,
            })
        );
        assert_eq!(
            numbering.find_level("42", "1"),
            Some(NumberingLevel {
                level_index: 1,
                is_ordered: true,
            })
        );
        assert_eq!(numbering.find_level("43", "0"), None);
    }

    #[test]
    fn test_relationships_lookup() {
        let relationships = Relationships::parse(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
                <Relationship Id="rId1" Type=".../hyperlink" Target="http://example.com" TargetMode="External"/>
                <Relationship Id="rId2" Type=".../image" Target="media/image1.png"/>
            </Relationships>"#,
        )
        .expect("parses");

        let hyperlink = relationships.target("rId1").expect("found");
        assert_eq!(hyperlink.target, "http://example.com");
        assert!(hyperlink.is_external);

        let image = relationships.target("rId2").expect("found");
        assert_eq!(image.target, "media/image1.png");
        assert!(!image.is_external);
    }
}
