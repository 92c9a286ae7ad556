//! Unit tests for SDMX payload parsing
//!
//! Fixtures follow the shape of the IMF SDMX_XML service responses, trimmed
//! to the elements the parsers care about.

use super::*;
use crate::app::models::{CodelistRole, Observation};
use crate::errors::ParseError;

const DATAFLOW_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Structure xmlns="http://www.SDMX.org/resources/SDMXML/schemas/v2_0/message">
  <Header><ID>DF</ID></Header>
  <Dataflows>
    <Dataflow xmlns="http://www.SDMX.org/resources/SDMXML/schemas/v2_0/structure" id="DS-GFS" agencyID="IMF">
      <Name xml:lang="en">Government Finance</Name>
      <KeyFamilyRef>
        <KeyFamilyID>GFS</KeyFamilyID>
        <KeyFamilyAgencyID>IMF</KeyFamilyAgencyID>
      </KeyFamilyRef>
    </Dataflow>
    <Dataflow xmlns="http://www.SDMX.org/resources/SDMXML/schemas/v2_0/structure" id="DS-BOP" agencyID="IMF">
      <Name xml:lang="en">Balance of Payments</Name>
      <KeyFamilyRef>
        <KeyFamilyID>BOP</KeyFamilyID>
      </KeyFamilyRef>
    </Dataflow>
  </Dataflows>
</Structure>"#;

const STRUCTURE_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Structure xmlns="http://www.SDMX.org/resources/SDMXML/schemas/v2_0/message">
  <CodeLists>
    <CodeList xmlns="http://www.SDMX.org/resources/SDMXML/schemas/v2_0/structure" id="CL_UNIT_MULT" agencyID="IMF">
      <Name xml:lang="en">Scale</Name>
      <Code value="0"><Description xml:lang="en">Units</Description></Code>
    </CodeList>
    <CodeList xmlns="http://www.SDMX.org/resources/SDMXML/schemas/v2_0/structure" id="CL_FREQ" agencyID="IMF">
      <Name xml:lang="en">Frequency</Name>
      <Code value="A"><Description xml:lang="en">Annual</Description></Code>
      <Code value="Q"><Description xml:lang="en">Quarterly</Description></Code>
      <Code value="M"><Description xml:lang="en">Monthly</Description></Code>
    </CodeList>
    <CodeList xmlns="http://www.SDMX.org/resources/SDMXML/schemas/v2_0/structure" id="CL_AREA_BOP" agencyID="IMF">
      <Name xml:lang="en">Geographical Areas</Name>
      <Code value="US"><Description xml:lang="en">United States</Description></Code>
      <Code value="DE"><Description xml:lang="en">Germany</Description></Code>
    </CodeList>
  </CodeLists>
</Structure>"#;

const COMPACT_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<CompactData xmlns="http://www.SDMX.org/resources/SDMXML/schemas/v2_0/message">
  <Header><ID>IFS</ID></Header>
  <DataSet xmlns="http://dataservices.imf.org/compact/IFS">
    <Series FREQ="A" REF_AREA="US" INDICATOR="NGDP" UNIT_MULT="6" TIME_FORMAT="P1Y">
      <Obs TIME_PERIOD="2019" OBS_VALUE="21380976" />
      <Obs TIME_PERIOD="2020" OBS_VALUE="21060474" />
      <Obs TIME_PERIOD="2021" OBS_VALUE="23315081" />
    </Series>
    <Series FREQ="A" REF_AREA="DE" INDICATOR="NGDP" UNIT_MULT="6" TIME_FORMAT="P1Y">
      <Obs TIME_PERIOD="2019" OBS_VALUE="3473350" />
      <Obs TIME_PERIOD="2020" OBS_VALUE="3403730" />
      <Obs TIME_PERIOD="2021" OBS_VALUE="3617450" />
    </Series>
  </DataSet>
</CompactData>"#;

#[test]
fn test_dataflows_sorted_by_name() {
    let dataflows = parse_dataflows(DATAFLOW_XML).unwrap();
    let ids: Vec<_> = dataflows.iter().map(|d| d.key_family_id.as_str()).collect();
    assert_eq!(ids, vec!["BOP", "GFS"]);
    assert_eq!(dataflows[0].name, "Balance of Payments");
    assert_eq!(dataflows[1].name, "Government Finance");
}

#[test]
fn test_dataflows_missing_fields_skipped() {
    let xml = r#"<Dataflows>
        <Dataflow><Name>Has no id</Name></Dataflow>
        <Dataflow><KeyFamilyRef><KeyFamilyID>NONAME</KeyFamilyID></KeyFamilyRef></Dataflow>
        <Dataflow><Name/><KeyFamilyID>EMPTY</KeyFamilyID></Dataflow>
        <Dataflow><Name>Complete</Name><KeyFamilyID>OK</KeyFamilyID></Dataflow>
    </Dataflows>"#;

    let dataflows = parse_dataflows(xml).unwrap();
    assert_eq!(dataflows.len(), 1);
    assert_eq!(dataflows[0].key_family_id, "OK");
}

#[test]
fn test_dataflows_first_name_wins_and_entities_unescaped() {
    let xml = r#"<Dataflows>
        <Dataflow>
            <Name xml:lang="en">Prices &amp; Wages</Name>
            <Name xml:lang="fr">Prix et salaires</Name>
            <KeyFamilyID>PW</KeyFamilyID>
        </Dataflow>
    </Dataflows>"#;

    let dataflows = parse_dataflows(xml).unwrap();
    assert_eq!(dataflows.len(), 1);
    assert_eq!(dataflows[0].name, "Prices & Wages");
}

#[test]
fn test_dataflows_empty_document() {
    assert!(parse_dataflows("<Structure/>").unwrap().is_empty());
}

#[test]
fn test_dataflows_malformed_xml() {
    let result = parse_dataflows("<Dataflows><Dataflow><Name>x</Dataflow>");
    assert!(matches!(result, Err(ParseError::Xml { .. })));
}

#[test]
fn test_codelists_missing_indicator_list() {
    let lists = parse_codelists(STRUCTURE_XML, "BOP").unwrap();

    let freq: Vec<_> = lists
        .codes(CodelistRole::Frequency)
        .iter()
        .map(|c| c.value.as_str())
        .collect();
    assert_eq!(freq, vec!["A", "Q", "M"]);

    let area = lists.codes(CodelistRole::Area);
    assert_eq!(area.len(), 2);
    assert_eq!(area[0].description, "United States");
    assert_eq!(area[0].value, "US");

    assert!(lists.codes(CodelistRole::Indicator).is_empty());
    let (_, indicator_id, codes) = lists.iter().last().unwrap();
    assert_eq!(indicator_id, "CL_INDICATOR_BOP");
    assert!(codes.is_empty());
    assert_eq!(lists.iter().count(), 3);
}

#[test]
fn test_codelists_for_other_dataflow_ignored() {
    let lists = parse_codelists(STRUCTURE_XML, "GFS").unwrap();
    assert_eq!(lists.codes(CodelistRole::Frequency).len(), 3);
    assert!(lists.codes(CodelistRole::Area).is_empty());
    assert!(lists.codes(CodelistRole::Indicator).is_empty());
}

#[test]
fn test_codelists_first_occurrence_wins() {
    let xml = r#"<CodeLists>
        <CodeList id="CL_INDICATOR_X"><Code value="ONE"><Description>First</Description></Code></CodeList>
        <CodeList id="CL_INDICATOR_X"><Code value="TWO"><Description>Second</Description></Code></CodeList>
    </CodeLists>"#;

    let lists = parse_codelists(xml, "X").unwrap();
    let indicators = lists.codes(CodelistRole::Indicator);
    assert_eq!(indicators.len(), 1);
    assert_eq!(indicators[0].value, "ONE");
}

#[test]
fn test_codelists_self_closing_list_counts_as_first() {
    let xml = r#"<CodeLists>
        <CodeList id="CL_FREQ"/>
        <CodeList id="CL_FREQ"><Code value="A"><Description>Annual</Description></Code></CodeList>
        <CodeList id="CL_AREA_X"><Code value="US"><Description>United States</Description></Code></CodeList>
    </CodeLists>"#;

    let lists = parse_codelists(xml, "X").unwrap();
    assert!(lists.codes(CodelistRole::Frequency).is_empty());
    assert_eq!(lists.codes(CodelistRole::Area).len(), 1);
}

#[test]
fn test_codelists_code_edge_cases() {
    let xml = r#"<CodeLists>
        <CodeList id="CL_AREA_X">
            <Code value="NODESC"/>
            <Code><Description>No value</Description></Code>
            <Code value="EMPTY"><Description/></Code>
            <Code value="TWO"><Description xml:lang="en">English</Description><Description xml:lang="fr">Francais</Description></Code>
        </CodeList>
    </CodeLists>"#;

    let lists = parse_codelists(xml, "X").unwrap();
    let area = lists.codes(CodelistRole::Area);
    let values: Vec<_> = area.iter().map(|c| c.value.as_str()).collect();
    assert_eq!(values, vec!["NODESC", "EMPTY", "TWO"]);
    assert_eq!(area[0].description, "");
    assert_eq!(area[1].description, "");
    assert_eq!(area[2].description, "English");
}

#[test]
fn test_series_two_tables() {
    let tables = parse_series(COMPACT_XML).unwrap();
    assert_eq!(tables.len(), 2);

    assert_eq!(tables[0].label(), "A_US_NGDP");
    assert_eq!(tables[0].observations.len(), 3);
    assert_eq!(
        tables[0].observations[0],
        Observation::new("2019", "21380976")
    );
    assert_eq!(tables[1].key.area, "DE");
    assert_eq!(tables[1].observations[2].timeperiod, "2021");
}

#[test]
fn test_series_missing_attributes_and_empty_series() {
    let xml = r#"<CompactData><DataSet>
        <Series FREQ="Q" REF_AREA="FR"/>
        <Series FREQ="M" REF_AREA="IT" INDICATOR="PCPI">
            <Obs TIME_PERIOD="2020-01"/>
        </Series>
    </DataSet></CompactData>"#;

    let tables = parse_series(xml).unwrap();
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0].key.indicator, "");
    assert!(tables[0].observations.is_empty());
    assert_eq!(tables[1].observations, vec![Observation::new("2020-01", "")]);
}

#[test]
fn test_series_none_returned() {
    let xml = r#"<CompactData><Header/><DataSet/></CompactData>"#;
    assert!(parse_series(xml).unwrap().is_empty());
}
