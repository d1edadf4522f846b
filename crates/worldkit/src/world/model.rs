use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum Shape {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Polygon {
        points: Vec<Point>,
    },
}

impl Shape {
    pub fn as_rect(&self) -> Option<Rect> {
        match *self {
            Self::Rect {
                x,
                y,
                width,
                height,
            } => Some(Rect {
                x,
                y,
                width,
                height,
            }),
            Self::Polygon { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoiKind {
    Company,
    Project,
    Service,
    Contact,
    Landmark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoiStatus {
    Live,
    Beta,
    InProgress,
    Planned,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualType {
    Building,
    Sign,
    Kiosk,
    Marker,
    None,
}

// Hitbox is relative to the top-left of the POI box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PoiWorld {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hitbox: Option<Rect>,
    pub interact_radius: f64,
    pub visual: VisualType,
    pub solid: bool,
}

impl PoiWorld {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase",
    deny_unknown_fields
)]
pub enum PoiAction {
    OpenLink {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confirm_message: Option<String>,
    },
    OpenModal {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dialogue_id: Option<String>,
    },
    ComingSoon {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

impl PoiAction {
    pub fn id(&self) -> &str {
        match self {
            Self::OpenLink { id, .. } | Self::OpenModal { id, .. } | Self::ComingSoon { id, .. } => {
                id
            }
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::OpenLink { label, .. }
            | Self::OpenModal { label, .. }
            | Self::ComingSoon { label, .. } => label.as_deref(),
        }
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::OpenLink { .. } => "open_link",
            Self::OpenModal { .. } => "open_modal",
            Self::ComingSoon { .. } => "coming_soon",
        }
    }

    pub fn overlaid(self, later: PoiAction) -> PoiAction {
        match (self, later) {
            (
                Self::OpenLink {
                    label: earlier_label,
                    confirm_message: earlier_confirm,
                    ..
                },
                Self::OpenLink {
                    id,
                    label,
                    href,
                    confirm_message,
                },
            ) => Self::OpenLink {
                id,
                label: label.or(earlier_label),
                href,
                confirm_message: confirm_message.or(earlier_confirm),
            },
            (
                Self::OpenModal {
                    label: earlier_label,
                    dialogue_id: earlier_dialogue,
                    ..
                },
                Self::OpenModal {
                    id,
                    label,
                    dialogue_id,
                },
            ) => Self::OpenModal {
                id,
                label: label.or(earlier_label),
                dialogue_id: dialogue_id.or(earlier_dialogue),
            },
            (earlier, later) => {
                let fallback = earlier.label().map(str::to_string);
                later.with_label_fallback(fallback)
            }
        }
    }

    fn with_label_fallback(self, fallback: Option<String>) -> PoiAction {
        match self {
            Self::OpenLink {
                id,
                label,
                href,
                confirm_message,
            } => Self::OpenLink {
                id,
                label: label.or(fallback),
                href,
                confirm_message,
            },
            Self::OpenModal {
                id,
                label,
                dialogue_id,
            } => Self::OpenModal {
                id,
                label: label.or(fallback),
                dialogue_id,
            },
            Self::ComingSoon { id, label } => Self::ComingSoon {
                id,
                label: label.or(fallback),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Poi {
    pub id: String,
    pub kind: PoiKind,
    pub name: String,
    pub status: PoiStatus,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialog_text: Option<String>,
    pub world: PoiWorld,
    pub actions: Vec<PoiAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_id: Option<String>,
}
