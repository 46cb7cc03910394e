use anyhow::{Error, bail};
use std::fmt;
use std::str::FromStr;

/// Export formats the dataset API can produce for a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnnotationFormat {
    /// COCO JSON, one `_annotations.coco.json` per subset.
    #[default]
    Coco,
    /// Pascal VOC XML, one file per image.
    Voc,
    Yolov5,
    Yolov7,
    Yolov8,
    Yolov9,
    Yolov11,
    Darknet,
    CreateMl,
    TfRecord,
    Multiclass,
    Folder,
    PngMaskSemantic,
}

impl AnnotationFormat {
    pub const ALL: [AnnotationFormat; 13] = [
        AnnotationFormat::Coco,
        AnnotationFormat::Voc,
        AnnotationFormat::Yolov5,
        AnnotationFormat::Yolov7,
        AnnotationFormat::Yolov8,
        AnnotationFormat::Yolov9,
        AnnotationFormat::Yolov11,
        AnnotationFormat::Darknet,
        AnnotationFormat::CreateMl,
        AnnotationFormat::TfRecord,
        AnnotationFormat::Multiclass,
        AnnotationFormat::Folder,
        AnnotationFormat::PngMaskSemantic,
    ];

    /// User-facing name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            AnnotationFormat::Coco => "coco",
            AnnotationFormat::Voc => "voc",
            AnnotationFormat::Yolov5 => "yolov5",
            AnnotationFormat::Yolov7 => "yolov7",
            AnnotationFormat::Yolov8 => "yolov8",
            AnnotationFormat::Yolov9 => "yolov9",
            AnnotationFormat::Yolov11 => "yolov11",
            AnnotationFormat::Darknet => "darknet",
            AnnotationFormat::CreateMl => "createml",
            AnnotationFormat::TfRecord => "tfrecord",
            AnnotationFormat::Multiclass => "multiclass",
            AnnotationFormat::Folder => "folder",
            AnnotationFormat::PngMaskSemantic => "png-mask-semantic",
        }
    }

    /// Identifier used in the export URL.
    pub fn wire_id(self) -> &'static str {
        match self {
            AnnotationFormat::Yolov5 => "yolov5pytorch",
            AnnotationFormat::Yolov7 => "yolov7pytorch",
            other => other.name(),
        }
    }

    /// Name of the single annotation file placed in each subset, when the format has one.
    pub fn annotation_file(self) -> Option<&'static str> {
        match self {
            AnnotationFormat::Coco => Some("_annotations.coco.json"),
            AnnotationFormat::CreateMl => Some("_annotations.createml.json"),
            AnnotationFormat::Multiclass => Some("_classes.csv"),
            _ => None,
        }
    }
}

impl fmt::Display for AnnotationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnnotationFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let format = match lower.as_str() {
            "coco" | "coco-json" => AnnotationFormat::Coco,
            "voc" | "pascal-voc" | "pascalvoc" => AnnotationFormat::Voc,
            "yolov5" | "yolov5pytorch" => AnnotationFormat::Yolov5,
            "yolov7" | "yolov7pytorch" => AnnotationFormat::Yolov7,
            "yolov8" | "yolo" => AnnotationFormat::Yolov8,
            "yolov9" => AnnotationFormat::Yolov9,
            "yolov11" => AnnotationFormat::Yolov11,
            "darknet" => AnnotationFormat::Darknet,
            "createml" => AnnotationFormat::CreateMl,
            "tfrecord" => AnnotationFormat::TfRecord,
            "multiclass" => AnnotationFormat::Multiclass,
            "folder" => AnnotationFormat::Folder,
            "png-mask-semantic" => AnnotationFormat::PngMaskSemantic,
            _ => bail!(
                "unsupported annotation format {:?} (expected one of: {})",
                s,
                AnnotationFormat::ALL
                    .iter()
                    .map(|f| f.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };
        Ok(format)
    }
}
