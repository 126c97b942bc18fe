use serde::{Deserialize, Serialize};

/// A unique layer identifier within a layer stack.
pub type LayerId = u32;

/// Preferred routing direction of a metal layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Tracks run along x and are stacked in y.
    Horizontal,
    /// Tracks run along y and are stacked in x.
    Vertical,
}

impl Orientation {
    pub fn is_horizontal(self) -> bool {
        self == Orientation::Horizontal
    }
}

/// How the tracks of a metal layer are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStyle {
    /// Random segment/gap walk bounded by the length and tip-to-tip rules.
    #[default]
    Random,
    /// One rail spanning the whole track.
    Continuous,
}

/// A routing metal layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetalLayer {
    pub id: LayerId,
    pub name: String,
    pub gds_layer: u16,
    pub gds_datatype: u16,
    pub orientation: Orientation,
    pub track_pitch: f64,
    #[serde(default)]
    pub fill: FillStyle,
}

impl MetalLayer {
    pub fn new(
        id: LayerId,
        name: &str,
        orientation: Orientation,
        track_pitch: f64,
        gds_layer: u16,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            gds_layer,
            gds_datatype: 0,
            orientation,
            track_pitch,
            fill: FillStyle::Random,
        }
    }

    pub fn with_fill(mut self, fill: FillStyle) -> Self {
        self.fill = fill;
        self
    }
}

/// A cut layer joining two metals of perpendicular orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViaLayer {
    pub id: LayerId,
    pub name: String,
    pub gds_layer: u16,
    pub gds_datatype: u16,
    pub bottom: LayerId,
    pub top: LayerId,
}

impl ViaLayer {
    pub fn new(id: LayerId, name: &str, bottom: LayerId, top: LayerId, gds_layer: u16) -> Self {
        Self {
            id,
            name: name.to_string(),
            gds_layer,
            gds_datatype: 0,
            bottom,
            top,
        }
    }
}

/// Metals (bottom to top) and the via layers between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerStack {
    metals: Vec<MetalLayer>,
    #[serde(default)]
    vias: Vec<ViaLayer>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a metal above the existing ones.
    pub fn add_metal(&mut self, metal: MetalLayer) {
        self.metals.push(metal);
    }

    pub fn add_via(&mut self, via: ViaLayer) {
        self.vias.push(via);
    }

    pub fn with_metal(mut self, metal: MetalLayer) -> Self {
        self.add_metal(metal);
        self
    }

    pub fn with_via(mut self, via: ViaLayer) -> Self {
        self.add_via(via);
        self
    }

    pub fn metal(&self, id: LayerId) -> Option<&MetalLayer> {
        self.metals.iter().find(|m| m.id == id)
    }

    pub fn metal_mut(&mut self, id: LayerId) -> Option<&mut MetalLayer> {
        self.metals.iter_mut().find(|m| m.id == id)
    }

    pub fn via_layer(&self, id: LayerId) -> Option<&ViaLayer> {
        self.vias.iter().find(|v| v.id == id)
    }

    pub fn metals(&self) -> &[MetalLayer] {
        &self.metals
    }

    pub fn vias(&self) -> &[ViaLayer] {
        &self.vias
    }

    /// GDS `(layer, datatype)` of any metal or via layer.
    pub fn gds_mapping(&self, id: LayerId) -> Option<(u16, u16)> {
        self.metal(id)
            .map(|m| (m.gds_layer, m.gds_datatype))
            .or_else(|| self.via_layer(id).map(|v| (v.gds_layer, v.gds_datatype)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_metal_stack() -> LayerStack {
        LayerStack::new()
            .with_metal(MetalLayer::new(1, "M1", Orientation::Horizontal, 42.0, 110))
            .with_metal(MetalLayer::new(2, "M2", Orientation::Vertical, 31.5, 111))
            .with_via(ViaLayer::new(3, "V1", 1, 2, 112))
    }

    #[test]
    fn test_gds_mapping() {
        let stack = two_metal_stack();
        assert_eq!(stack.gds_mapping(2), Some((111, 0)));
        assert_eq!(stack.gds_mapping(3), Some((112, 0)));
        assert_eq!(stack.gds_mapping(9), None);
    }

    #[test]
    fn test_fill_defaults_to_random_in_json() {
        let json = r#"{"id":1,"name":"M1","gds_layer":110,"gds_datatype":0,
                       "orientation":"horizontal","track_pitch":42.0}"#;
        let metal: MetalLayer = serde_json::from_str(json).unwrap();
        assert_eq!(metal.fill, FillStyle::Random);
        assert!(metal.orientation.is_horizontal());
    }
}
