//! Decoders for the two XML document shapes the API returns.

use serde::Deserialize;

use crate::error::Result;
use crate::ns::types::EligibilityResult;
use crate::utils::normalize_name;

/// Text content of a child element; an empty element decodes to `""`.
#[derive(Debug, Default, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    text: String,
}

/// `<REGION id="..."><NATIONS>a:b:c</NATIONS></REGION>`
#[derive(Debug, Deserialize)]
struct RegionDocument {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "NATIONS")]
    nations: TextNode,
}

/// `<NATION id="..."><REGION>Name</REGION><TGCANRECRUIT>1</TGCANRECRUIT></NATION>`
#[derive(Debug, Deserialize)]
struct NationDocument {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "REGION")]
    region: TextNode,
    #[serde(rename = "TGCANRECRUIT")]
    can_recruit: Option<TextNode>,
}

/// Decode a region member list, keeping server order and duplicates
pub fn decode_region_list(body: &[u8]) -> Result<Vec<String>> {
    let document: RegionDocument = quick_xml::de::from_reader(body)?;
    let nations = document.nations.text.trim();

    tracing::trace!(region = %document.id, "decoded region document");

    if nations.is_empty() {
        return Ok(Vec::new());
    }

    Ok(nations.split(':').map(str::to_string).collect())
}

/// Decode a recruitment eligibility document.
///
/// Only a flag of exactly `1` means the nation can receive recruitment
/// telegrams; any other value, or no flag at all, means it cannot.
pub fn decode_eligibility(body: &[u8]) -> Result<EligibilityResult> {
    let document: NationDocument = quick_xml::de::from_reader(body)?;

    Ok(EligibilityResult {
        member: document.id,
        home_region: normalize_name(&document.region.text),
        can_receive: document
            .can_recruit
            .map(|flag| flag.text.trim() == "1")
            .unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecruitError;

    #[test]
    fn region_list_preserves_order_and_duplicates() {
        let body = br#"<?xml version="1.0" encoding="UTF-8"?>
<REGION id="the_europeian_union"><NATIONS>gamma:alpha:beta:alpha</NATIONS></REGION>"#;

        let members = decode_region_list(body).unwrap();
        assert_eq!(members, vec!["gamma", "alpha", "beta", "alpha"]);
    }

    #[test]
    fn region_list_with_single_member() {
        let body = br#"<REGION id="lonely"><NATIONS>hermit</NATIONS></REGION>"#;
        assert_eq!(decode_region_list(body).unwrap(), vec!["hermit"]);
    }

    #[test]
    fn empty_region_decodes_to_no_members() {
        let body = br#"<REGION id="ghost_town"><NATIONS></NATIONS></REGION>"#;
        assert!(decode_region_list(body).unwrap().is_empty());
    }

    #[test]
    fn region_list_ignores_unrelated_children() {
        let body = br#"<REGION id="lazarus"><NAME>Lazarus</NAME><NATIONS>a:b</NATIONS><NUMNATIONS>2</NUMNATIONS></REGION>"#;
        assert_eq!(decode_region_list(body).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn region_list_without_nations_is_a_decode_error() {
        let body = br#"<REGION id="lazarus"><NAME>Lazarus</NAME></REGION>"#;
        assert!(matches!(decode_region_list(body), Err(RecruitError::Decode(_))));
    }

    #[test]
    fn region_list_without_id_is_a_decode_error() {
        let body = br#"<REGION><NATIONS>a:b</NATIONS></REGION>"#;
        assert!(matches!(decode_region_list(body), Err(RecruitError::Decode(_))));
    }

    #[test]
    fn garbage_body_is_a_decode_error() {
        assert!(matches!(
            decode_region_list(b"<html><body>502 Bad Gateway"),
            Err(RecruitError::Decode(_))
        ));
    }

    #[test]
    fn eligibility_flag_one_is_eligible() {
        let body = br#"<NATION id="alpha"><REGION>The Europeian Union</REGION><TGCANRECRUIT>1</TGCANRECRUIT></NATION>"#;

        let result = decode_eligibility(body).unwrap();
        assert_eq!(result.member, "alpha");
        assert_eq!(result.home_region, "the_europeian_union");
        assert!(result.can_receive);
    }

    #[test]
    fn eligibility_other_flag_values_are_not_eligible() {
        for flag in ["0", "", "true", "yes", "2"] {
            let body = format!(
                r#"<NATION id="beta"><REGION>Lazarus</REGION><TGCANRECRUIT>{}</TGCANRECRUIT></NATION>"#,
                flag
            );
            let result = decode_eligibility(body.as_bytes()).unwrap();
            assert!(!result.can_receive, "flag {:?} decoded as eligible", flag);
        }
    }

    #[test]
    fn eligibility_missing_flag_is_not_eligible() {
        let body = br#"<NATION id="gamma"><REGION>Lazarus</REGION></NATION>"#;
        let result = decode_eligibility(body).unwrap();

        assert!(!result.can_receive);
        assert_eq!(result.home_region, "lazarus");
    }

    #[test]
    fn malformed_eligibility_is_a_decode_error_not_ineligible() {
        let body = br#"<NATION><TGCANRECRUIT>0</TGCANRECRUIT></NATION>"#;
        assert!(matches!(decode_eligibility(body), Err(RecruitError::Decode(_))));
    }
}
