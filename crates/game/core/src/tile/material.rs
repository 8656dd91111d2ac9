//! Materials and the exposure table applied by heat and ice bombs.

use strum::{AsRefStr, Display};

use super::{Tile, TileKind};

/// What a tile is made of. Drives reaction force and bomb exposure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Material {
    #[default]
    Default,
    Stone,
    Metallic,
    Wooden,
    Ice,
    Fire,
    Magnetic,
    Plastic,
}

impl Material {
    pub fn minimum_reaction_force(self) -> u8 {
        match self {
            Material::Plastic => 0,
            Material::Metallic => 2,
            _ => 1,
        }
    }
}

impl Tile {
    /// Tile this one becomes when exposed to `material`, or `None` when unaffected.
    ///
    /// Exposed variants remember what they were so the opposite exposure can
    /// restore them. Occupants carry over.
    pub fn changes_to_on_exposure(&self, material: Material) -> Option<Tile> {
        use TileKind::*;
        let remembered = |kind: TileKind| self.morphed(kind).with_previous(self.clone());
        let restored = |fallback: TileKind| {
            let mut tile = self.previous_or(fallback);
            if let Some(occupant) = self.occupant() {
                tile.set_occupant(occupant.clone());
            }
            tile
        };

        match (material, self.kind()) {
            (Material::Fire, Wall) => Some(remembered(HotWall)),
            (Material::Fire, IcyWall) => Some(restored(Wall)),
            (Material::Fire, Ice) => Some(restored(Ground)),
            (Material::Fire, ThinIce) => Some(self.morphed(Water)),
            (Material::Fire, IcyBox) => Some(restored(Box)),
            (Material::Fire, Box | JumpBox | StickyBox) => Some(remembered(HotBox)),
            (Material::Fire, WoodenBox) => Some(self.occupant_or_empty()),
            (Material::Fire, Bridge) => Some(restored(Water)),

            (Material::Ice, Wall) => Some(remembered(IcyWall)),
            (Material::Ice, HotWall) => Some(restored(Wall)),
            (Material::Ice, Lava) => Some(self.morphed(Ground)),
            (Material::Ice, Water | DeepWater | ThinIce) => Some(remembered(Ice)),
            (Material::Ice, Box | WoodenBox | JumpBox | StickyBox) => Some(remembered(IcyBox)),
            (Material::Ice, HotBox) => Some(restored(Box)),

            // The wall under the disruption takes the exposure; the countdown carries on.
            (Material::Fire | Material::Ice, DisruptedWall) => {
                let beneath = self.previous_or(Wall).changes_to_on_exposure(material)?;
                Some(self.clone().with_previous(beneath))
            }

            _ => None,
        }
    }
}
