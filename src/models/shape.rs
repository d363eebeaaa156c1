//! Shape and orientation of an image, derived from its pixel dimensions.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Square,
    Rectangle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Symmetrical,
    Landscape,
    Portrait,
}

/// Computed geometry of one image. This is both the success response and
/// the content of the persisted `.img.meta` object.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageShape {
    pub shape: Shape,
    pub orientation: Orientation,
    pub width: u32,
    pub height: u32,
}

impl ImageShape {
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        let (shape, orientation) = classify(width, height);
        Self {
            shape,
            orientation,
            width,
            height,
        }
    }
}

/// Classify a `width` x `height` image.
///
/// Total over all inputs, zero included: equal sides are square, otherwise
/// the longer side decides the orientation.
pub fn classify(width: u32, height: u32) -> (Shape, Orientation) {
    if width == height {
        (Shape::Square, Orientation::Symmetrical)
    } else if width > height {
        (Shape::Rectangle, Orientation::Landscape)
    } else {
        (Shape::Rectangle, Orientation::Portrait)
    }
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Square => "Square",
            Shape::Rectangle => "Rectangle",
        }
    }
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Symmetrical => "Symmetrical",
            Orientation::Landscape => "Landscape",
            Orientation::Portrait => "Portrait",
        }
    }
}

impl FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Square" => Ok(Shape::Square),
            "Rectangle" => Ok(Shape::Rectangle),
            other => Err(format!("unknown shape `{}`", other)),
        }
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Symmetrical" => Ok(Orientation::Symmetrical),
            "Landscape" => Ok(Orientation::Landscape),
            "Portrait" => Ok(Orientation::Portrait),
            other => Err(format!("unknown orientation `{}`", other)),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Both enums travel as their bare names so the wire form stays a flat
// string-valued mapping regardless of how the encoder treats enums.

impl Serialize for Shape {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Shape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

impl Serialize for Orientation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Orientation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}
