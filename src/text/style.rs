//! Text property sets and their merge stacks.
//!
//! Paragraph and run properties merge shallowly per field along
//! default-text-style → master placeholder → layout placeholder → slide
//! paragraph (→ table text style for cells). Nested `bullet` and `defRPr`
//! objects merge by field as well, never as atomic values.

use crate::drawing::color::ColorDef;
use crate::geom::units::emu_to_px;
use crate::xml::{XmlNode, ns};

/// Character-level properties from `rPr`/`defRPr`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunProps {
    /// Size in hundredths of a point.
    pub size: Option<i64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    /// Underline kind (`sng`, `dbl`, `none`, …).
    pub underline: Option<String>,
    pub strike: Option<bool>,
    pub color: Option<ColorDef>,
    /// Latin typeface, possibly a `+mj-lt`/`+mn-lt` theme alias.
    pub latin: Option<String>,
    pub highlight: Option<ColorDef>,
    /// Baseline shift as a ratio of font size; positive raises.
    pub baseline: Option<f64>,
    /// Capitalization (`all`, `small`, `none`).
    pub caps: Option<String>,
    /// Character spacing in hundredths of a point.
    pub spacing: Option<i64>,
    /// Hyperlink relationship id from `hlinkClick`.
    pub hyperlink_rid: Option<String>,
}

impl RunProps {
    /// Parse an `rPr`/`defRPr`/`endParaRPr` element.
    pub fn parse(node: &XmlNode) -> RunProps {
        RunProps {
            size: node.attr_i64("sz"),
            bold: node.attr_bool("b"),
            italic: node.attr_bool("i"),
            underline: node.attr("u").map(str::to_string),
            strike: node.attr("strike").map(|v| v != "noStrike"),
            color: node
                .child(ns::DML, "solidFill")
                .and_then(ColorDef::from_parent),
            latin: node
                .child(ns::DML, "latin")
                .and_then(|latin| latin.attr("typeface"))
                .map(str::to_string),
            highlight: node
                .child(ns::DML, "highlight")
                .and_then(ColorDef::from_parent),
            baseline: node.attr_i64("baseline").map(|v| v as f64 / 100_000.0),
            caps: node.attr("cap").map(str::to_string),
            spacing: node.attr_i64("spc"),
            hyperlink_rid: node
                .child(ns::DML, "hlinkClick")
                .and_then(|link| link.attr("id"))
                .map(str::to_string),
        }
    }

    /// Shallow merge: `other`'s present fields win.
    pub fn merged_with(&self, other: &RunProps) -> RunProps {
        RunProps {
            size: other.size.or(self.size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.clone().or_else(|| self.underline.clone()),
            strike: other.strike.or(self.strike),
            color: other.color.clone().or_else(|| self.color.clone()),
            latin: other.latin.clone().or_else(|| self.latin.clone()),
            highlight: other.highlight.clone().or_else(|| self.highlight.clone()),
            baseline: other.baseline.or(self.baseline),
            caps: other.caps.clone().or_else(|| self.caps.clone()),
            spacing: other.spacing.or(self.spacing),
            hyperlink_rid: other
                .hyperlink_rid
                .clone()
                .or_else(|| self.hyperlink_rid.clone()),
        }
    }
}

/// Bullet configuration, mergeable by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulletProps {
    /// `none`, `char`, or `autoNum`.
    pub kind: Option<String>,
    pub char: Option<String>,
    /// Numbering scheme for `autoNum` (e.g. `arabicPeriod`).
    pub scheme: Option<String>,
    pub start_at: Option<i64>,
}

impl BulletProps {
    pub fn parse(p_pr: &XmlNode) -> BulletProps {
        let mut bullet = BulletProps::default();
        if p_pr.child(ns::DML, "buNone").is_some() {
            bullet.kind = Some("none".to_string());
        } else if let Some(bu_char) = p_pr.child(ns::DML, "buChar") {
            bullet.kind = Some("char".to_string());
            bullet.char = bu_char.attr("char").map(str::to_string);
        } else if let Some(auto) = p_pr.child(ns::DML, "buAutoNum") {
            bullet.kind = Some("autoNum".to_string());
            bullet.scheme = auto.attr("type").map(str::to_string);
            bullet.start_at = auto.attr_i64("startAt");
        }
        bullet
    }

    pub fn merged_with(&self, other: &BulletProps) -> BulletProps {
        BulletProps {
            kind: other.kind.clone().or_else(|| self.kind.clone()),
            char: other.char.clone().or_else(|| self.char.clone()),
            scheme: other.scheme.clone().or_else(|| self.scheme.clone()),
            start_at: other.start_at.or(self.start_at),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self.kind.as_deref(), Some("none") | None)
    }
}

/// Paragraph-level properties from `pPr` (or a `lvlNpPr` template).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParaProps {
    /// Alignment: `l`, `ctr`, `r`, `just`.
    pub align: Option<String>,
    /// Left margin in pixels.
    pub mar_l: Option<f64>,
    /// First-line indent in pixels (negative for hanging indents).
    pub indent: Option<f64>,
    pub bullet: BulletProps,
    pub def_rpr: RunProps,
}

impl ParaProps {
    pub fn parse(node: &XmlNode) -> ParaProps {
        ParaProps {
            align: node.attr("algn").map(str::to_string),
            mar_l: node.attr_i64("marL").map(emu_to_px),
            indent: node.attr_i64("indent").map(emu_to_px),
            bullet: BulletProps::parse(node),
            def_rpr: node
                .child(ns::DML, "defRPr")
                .map(RunProps::parse)
                .unwrap_or_default(),
        }
    }

    pub fn merged_with(&self, other: &ParaProps) -> ParaProps {
        ParaProps {
            align: other.align.clone().or_else(|| self.align.clone()),
            mar_l: other.mar_l.or(self.mar_l),
            indent: other.indent.or(self.indent),
            bullet: self.bullet.merged_with(&other.bullet),
            def_rpr: self.def_rpr.merged_with(&other.def_rpr),
        }
    }
}

/// A 9-level paragraph style list (`lstStyle`, `titleStyle`, …).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListStyle {
    levels: [Option<ParaProps>; 9],
}

impl ListStyle {
    /// Parse `lvl1pPr`..`lvl9pPr` (plus `defPPr` folded into level 0).
    pub fn parse(node: &XmlNode) -> ListStyle {
        let mut style = ListStyle::default();
        if let Some(def) = node.child(ns::DML, "defPPr") {
            style.levels[0] = Some(ParaProps::parse(def));
        }
        for (index, slot) in style.levels.iter_mut().enumerate() {
            let name = format!("lvl{}pPr", index + 1);
            if let Some(lvl) = node.child(ns::DML, &name) {
                let parsed = ParaProps::parse(lvl);
                *slot = Some(match slot.take() {
                    Some(existing) => existing.merged_with(&parsed),
                    None => parsed,
                });
            }
        }
        style
    }

    pub fn level(&self, level: usize) -> Option<&ParaProps> {
        self.levels.get(level)?.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(Option::is_none)
    }
}

/// The master's default text styles, keyed by placeholder family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultTextStyles {
    pub title: ListStyle,
    pub body: ListStyle,
    pub other: ListStyle,
}

impl DefaultTextStyles {
    /// Parse a `txStyles` element (`titleStyle`/`bodyStyle`/`otherStyle`).
    pub fn parse(node: &XmlNode) -> DefaultTextStyles {
        let list = |name: &str| {
            node.child(ns::PML, name)
                .map(ListStyle::parse)
                .unwrap_or_default()
        };
        DefaultTextStyles {
            title: list("titleStyle"),
            body: list("bodyStyle"),
            other: list("otherStyle"),
        }
    }

    /// The style list that seeds a placeholder type's text.
    pub fn for_placeholder(&self, ph_type: &str) -> &ListStyle {
        match ph_type {
            "title" | "ctrTitle" => &self.title,
            "body" | "subTitle" | "obj" => &self.body,
            _ => &self.other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_props_parse() {
        let node = XmlNode::parse_fragment(
            r#"<a:rPr sz="1800" b="1" i="1" u="sng" strike="sngStrike" cap="all" spc="100" baseline="30000">
              <a:solidFill><a:srgbClr val="112233"/></a:solidFill>
              <a:latin typeface="+mn-lt"/>
              <a:hlinkClick r:id="rId4"/>
            </a:rPr>"#,
        );
        let props = RunProps::parse(&node);
        assert_eq!(props.size, Some(1800));
        assert_eq!(props.bold, Some(true));
        assert_eq!(props.italic, Some(true));
        assert_eq!(props.underline.as_deref(), Some("sng"));
        assert_eq!(props.strike, Some(true));
        assert_eq!(props.latin.as_deref(), Some("+mn-lt"));
        assert_eq!(props.caps.as_deref(), Some("all"));
        assert_eq!(props.baseline, Some(0.3));
        assert_eq!(props.hyperlink_rid.as_deref(), Some("rId4"));
    }

    #[test]
    fn test_run_merge_other_wins() {
        let base = RunProps {
            size: Some(1800),
            bold: Some(false),
            latin: Some("Calibri".to_string()),
            ..RunProps::default()
        };
        let over = RunProps {
            bold: Some(true),
            ..RunProps::default()
        };
        let merged = base.merged_with(&over);
        assert_eq!(merged.size, Some(1800));
        assert_eq!(merged.bold, Some(true));
        assert_eq!(merged.latin.as_deref(), Some("Calibri"));
    }

    #[test]
    fn test_bullet_parse_auto_num() {
        let node = XmlNode::parse_fragment(
            r#"<a:pPr lvl="1"><a:buAutoNum type="arabicPeriod" startAt="3"/></a:pPr>"#,
        );
        let bullet = BulletProps::parse(&node);
        assert_eq!(bullet.kind.as_deref(), Some("autoNum"));
        assert_eq!(bullet.scheme.as_deref(), Some("arabicPeriod"));
        assert_eq!(bullet.start_at, Some(3));
        assert!(!bullet.is_none());
    }

    #[test]
    fn test_bullet_none_beats_inherited_char() {
        let master = BulletProps {
            kind: Some("char".to_string()),
            char: Some("•".to_string()),
            ..BulletProps::default()
        };
        let slide = BulletProps {
            kind: Some("none".to_string()),
            ..BulletProps::default()
        };
        let merged = master.merged_with(&slide);
        assert!(merged.is_none());
        // The inherited glyph is still present in the merged record.
        assert_eq!(merged.char.as_deref(), Some("•"));
    }

    #[test]
    fn test_para_merge_nests() {
        let master = ParaProps {
            align: Some("l".to_string()),
            def_rpr: RunProps {
                size: Some(2000),
                ..RunProps::default()
            },
            ..ParaProps::default()
        };
        let slide = ParaProps {
            align: Some("ctr".to_string()),
            def_rpr: RunProps {
                bold: Some(true),
                ..RunProps::default()
            },
            ..ParaProps::default()
        };
        let merged = master.merged_with(&slide);
        assert_eq!(merged.align.as_deref(), Some("ctr"));
        assert_eq!(merged.def_rpr.size, Some(2000));
        assert_eq!(merged.def_rpr.bold, Some(true));
    }

    #[test]
    fn test_list_style_levels() {
        let node = XmlNode::parse_fragment(
            r#"<a:lstStyle>
              <a:lvl1pPr algn="l"><a:defRPr sz="2800"/></a:lvl1pPr>
              <a:lvl2pPr algn="l"><a:defRPr sz="2400"/></a:lvl2pPr>
            </a:lstStyle>"#,
        );
        let style = ListStyle::parse(&node);
        assert_eq!(style.level(0).unwrap().def_rpr.size, Some(2800));
        assert_eq!(style.level(1).unwrap().def_rpr.size, Some(2400));
        assert!(style.level(2).is_none());
        assert!(!style.is_empty());
    }

    #[test]
    fn test_default_text_styles_dispatch() {
        let node = XmlNode::parse_fragment(
            r#"<p:txStyles>
              <p:titleStyle><a:lvl1pPr><a:defRPr sz="4400"/></a:lvl1pPr></p:titleStyle>
              <p:bodyStyle><a:lvl1pPr><a:defRPr sz="2800"/></a:lvl1pPr></p:bodyStyle>
              <p:otherStyle><a:lvl1pPr><a:defRPr sz="1800"/></a:lvl1pPr></p:otherStyle>
            </p:txStyles>"#,
        );
        let styles = DefaultTextStyles::parse(&node);
        assert_eq!(
            styles.for_placeholder("title").level(0).unwrap().def_rpr.size,
            Some(4400)
        );
        assert_eq!(
            styles.for_placeholder("body").level(0).unwrap().def_rpr.size,
            Some(2800)
        );
        assert_eq!(
            styles.for_placeholder("sldNum").level(0).unwrap().def_rpr.size,
            Some(1800)
        );
    }
}
