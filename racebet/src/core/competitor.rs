use crate::interfaces::gui_interface::RgbColor;
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// * `glyph` - Display glyph, e.g. 🐴
/// * `name` - Competitor name, e.g. Classic
/// * `color` - Lane color as a CSS color string, e.g. #8b4513
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CompetitorPars {
    pub glyph: String,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    String::from("#ffffff")
}

/// default_roster returns the six competitors available when no parameter file is given.
pub fn default_roster() -> Vec<CompetitorPars> {
    [
        ("🐴", "Classic", "#8b4513"),
        ("🦄", "Unicorn", "#ff69b4"),
        ("🐸", "Pepe", "#32cd32"),
        ("🦖", "Dino", "#228b22"),
        ("🐉", "Dragon", "#dc143c"),
        ("🦅", "Eagle", "#daa520"),
    ]
    .iter()
    .map(|&(glyph, name, color)| CompetitorPars {
        glyph: glyph.to_owned(),
        name: name.to_owned(),
        color: color.to_owned(),
    })
    .collect()
}

/// Competitor holds the static identity of a runner. Speed and position are per race and live
/// in the race itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Competitor {
    pub idx: usize,
    pub glyph: String,
    pub name: String,
    pub color: RgbColor,
}

impl Competitor {
    pub fn new(idx: usize, competitor_pars: &CompetitorPars) -> anyhow::Result<Competitor> {
        let tmp_color = competitor_pars
            .color
            .parse::<css_color_parser::Color>()
            .context(format!(
                "Could not parse color {} of competitor {}!",
                competitor_pars.color, competitor_pars.name
            ))?;

        Ok(Competitor {
            idx,
            glyph: competitor_pars.glyph.to_owned(),
            name: competitor_pars.name.to_owned(),
            color: RgbColor {
                r: tmp_color.r,
                g: tmp_color.g,
                b: tmp_color.b,
            },
        })
    }

    /// The method returns the label shown in selection lists and the leaderboard.
    pub fn label(&self) -> String {
        format!("{} {}", self.glyph, self.name)
    }
}

/// create_roster builds the competitor list in parameter file order.
pub fn create_roster(competitor_pars_all: &[CompetitorPars]) -> anyhow::Result<Vec<Competitor>> {
    competitor_pars_all
        .iter()
        .enumerate()
        .map(|(idx, pars)| Competitor::new(idx, pars))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roster_has_six_competitors() {
        let roster = create_roster(&default_roster()).unwrap();
        assert_eq!(roster.len(), 6);
        assert_eq!(roster[0].label(), "🐴 Classic");
        assert_eq!(roster[5].idx, 5);
    }

    #[test]
    fn color_is_parsed() {
        let pars = CompetitorPars {
            glyph: String::from("🐉"),
            name: String::from("Dragon"),
            color: String::from("#ff0000"),
        };
        let competitor = Competitor::new(4, &pars).unwrap();
        assert_eq!(competitor.color, RgbColor { r: 255, g: 0, b: 0 });
    }

    #[test]
    fn bad_color_is_rejected() {
        let pars = CompetitorPars {
            glyph: String::from("🐸"),
            name: String::from("Pepe"),
            color: String::from("not-a-color"),
        };
        assert!(Competitor::new(0, &pars).is_err());
    }
}
