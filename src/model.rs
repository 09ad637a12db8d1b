use serde::{Deserialize, Serialize};

/// One organ-stop entry, the unit of extraction and storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRecord {
    pub names: Vec<NameEntry>,
    pub description: String,
    pub construction: String,
    pub usage: String,
    pub images: Vec<Image>,
    pub variants: Vec<StopLink>,
    pub comparisons: Vec<StopLink>,
    pub examples_description: String,
    pub examples: Vec<StopLink>,
    pub sound_clips: Vec<Division>,
    pub bibliography: Vec<BibliographyEntry>,
}

impl StopRecord {
    /// The canonical display name. Records produced by the parser always have one.
    pub fn primary_name(&self) -> Option<&NameEntry> {
        self.names.iter().find(|n| n.primary)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameEntry {
    pub name: String,
    pub origin: String,
    pub link: String,
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub file: String,
    pub subtitle: String,
}

/// `{name, link}` pair used by variants, comparisons and examples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopLink {
    pub name: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub division_name: String,
    pub clips: Vec<SoundClip>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundClip {
    pub name: String,
    pub organ_link: String,
    pub organ_name: String,
    pub organ_builder_name: String,
    pub files: Vec<ClipFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipFile {
    pub name: String,
    pub file: String,
}

/// Reserved for bibliography extraction; no extractor fills it yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographyEntry {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StopRecord {
        StopRecord {
            names: vec![
                NameEntry {
                    name: "Open Diapason".into(),
                    origin: "English".into(),
                    link: String::new(),
                    primary: true,
                },
                NameEntry {
                    name: "Principal".into(),
                    origin: "German".into(),
                    link: "Principal".into(),
                    primary: false,
                },
            ],
            description: "The foundation stop.".into(),
            construction: "Open metal pipes.".into(),
            usage: String::new(),
            images: vec![Image {
                file: "../../images/d/diapason.jpg".into(),
                subtitle: String::new(),
            }],
            variants: vec![StopLink {
                name: "Geigen Diapason".into(),
                link: "Geigen_Diapason".into(),
            }],
            comparisons: vec![],
            examples_description: "Found on most organs.".into(),
            examples: vec![StopLink {
                name: "Westminster Abbey".into(),
                link: String::new(),
            }],
            sound_clips: vec![Division {
                division_name: "Manual".into(),
                clips: vec![SoundClip {
                    name: "Open Diapason 8'".into(),
                    organ_link: "StMarys".into(),
                    organ_name: "St. Mary's".into(),
                    organ_builder_name: "Willis".into(),
                    files: vec![ClipFile {
                        name: "Arpeggio".into(),
                        file: "OpenDiapason1.mp3".into(),
                    }],
                }],
            }],
            bibliography: vec![],
        }
    }

    #[test]
    fn json_uses_camel_case_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("examplesDescription").is_some());
        assert!(json.get("soundClips").is_some());
        let clip = &json["soundClips"][0]["clips"][0];
        assert_eq!(clip["organBuilderName"], "Willis");
        assert_eq!(json["soundClips"][0]["divisionName"], "Manual");
    }

    #[test]
    fn record_survives_json_round_trip() {
        let record = sample();
        let text = serde_json::to_string_pretty(&record).unwrap();
        let back: StopRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.primary_name().unwrap().name, "Open Diapason");
    }
}
