/*!
 * Tests for the canonical parser, act classifier and serializer
 */

use anyhow::Result;
use scriptwai::screenplay::{
    classify_acts, load_document, parse_paragraphs, read_fdx, to_fountain, Act, DocumentFormat,
    ElementType, FirstHeadingPolicy, Paragraph, ParserOptions,
};
use scriptwai::errors::ParseError;
use crate::common;

/// Scene count equals the number of non-empty headings
#[test]
fn test_parse_paragraphs_withBlankHeading_shouldCountNonEmptyHeadings() {
    let paragraphs = vec![
        Paragraph::new("Scene Heading", "INT. ROOM - DAY"),
        Paragraph::new("Action", "He sits."),
        Paragraph::new("Scene Heading", "   "),
        Paragraph::new("Scene Heading", "EXT. STREET - NIGHT"),
        Paragraph::new("Action", ""),
        Paragraph::new("Scene Heading", "INT. CAR - NIGHT"),
    ];

    let screenplay = parse_paragraphs(&paragraphs, &ParserOptions::default());

    assert_eq!(screenplay.len(), 3);
    let ids: Vec<&str> = screenplay.scenes.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["S001", "S002", "S003"]);
    assert!(screenplay.scenes[1].elements.is_empty());
}

/// Content before the first heading is dropped
#[test]
fn test_parse_paragraphs_withContentBeforeHeading_shouldDropIt() {
    let paragraphs = vec![
        Paragraph::new("Action", "FADE IN:"),
        Paragraph::new("Scene Heading", "INT. ROOM - DAY"),
        Paragraph::new("Action", "He sits."),
    ];

    let screenplay = parse_paragraphs(&paragraphs, &ParserOptions::default());

    assert_eq!(screenplay.len(), 1);
    assert_eq!(screenplay.scenes[0].elements.len(), 1);
    assert_eq!(screenplay.scenes[0].elements[0].text, "He sits.");
}

/// The preamble policy skips the first heading
#[test]
fn test_parse_paragraphs_withPreamblePolicy_shouldSkipFirstHeading() {
    let paragraphs = vec![
        Paragraph::new("Scene Heading", "THE LONG NIGHT"),
        Paragraph::new("Action", "Written by nobody."),
        Paragraph::new("Scene Heading", "INT. ROOM - DAY"),
        Paragraph::new("Action", "He sits."),
    ];
    let options = ParserOptions::with_first_heading(FirstHeadingPolicy::Preamble);

    let screenplay = parse_paragraphs(&paragraphs, &options);

    assert_eq!(screenplay.len(), 1);
    assert_eq!(screenplay.scenes[0].id, "S001");
    assert_eq!(screenplay.scenes[0].heading, "INT. ROOM - DAY");
}

/// Unknown paragraph types are kept as Other
#[test]
fn test_parse_paragraphs_withUnknownType_shouldKeepAsOther() {
    let paragraphs = vec![
        Paragraph::new("Scene Heading", "INT. ROOM - DAY"),
        Paragraph::new("Transition", "CUT TO:"),
    ];

    let screenplay = parse_paragraphs(&paragraphs, &ParserOptions::default());

    assert_eq!(screenplay.scenes[0].elements[0].element_type, ElementType::Other);
}

/// A Final Draft file is read in document order with entities decoded
#[test]
fn test_read_fdx_withSampleDocument_shouldReadParagraphs() -> Result<()> {
    let paragraphs = read_fdx(common::SAMPLE_FDX)?;

    assert_eq!(paragraphs.len(), 8);
    assert_eq!(paragraphs[0], Paragraph::new("Scene Heading", "INT. DINER - NIGHT"));
    assert_eq!(paragraphs[4].text, "Salt & pepper. Always both.");
    assert_eq!(paragraphs[7].type_tag, "Transition");

    Ok(())
}

/// A document without the root element is rejected
#[test]
fn test_read_fdx_withoutRoot_shouldBeMalformed() {
    let result = read_fdx("<Content><Paragraph Type=\"Action\"><Text>x</Text></Paragraph></Content>");

    assert!(matches!(result, Err(ParseError::MalformedDocument(_))));
}

/// Scene ids, acts and elements survive loading a Final Draft document
#[test]
fn test_load_document_withFinalDraft_shouldBuildScenes() -> Result<()> {
    let mut screenplay = load_document(common::SAMPLE_FDX, DocumentFormat::FinalDraft, &ParserOptions::default())?;
    classify_acts(&mut screenplay);

    assert_eq!(screenplay.len(), 2);
    assert_eq!(screenplay.scenes[0].elements.len(), 4);
    assert_eq!(screenplay.scenes[0].act, Some(Act::ActI));
    assert_eq!(screenplay.scenes[1].act, Some(Act::ActII));

    Ok(())
}

/// Act boundaries fall exactly on the quarters
#[test]
fn test_classify_acts_withEightScenes_shouldSplitTwoFourTwo() {
    let screenplay = common::screenplay_with_scenes(8);
    let acts: Vec<Act> = screenplay.scenes.iter().filter_map(|s| s.act).collect();

    assert_eq!(
        acts,
        [
            Act::ActI,
            Act::ActI,
            Act::ActII,
            Act::ActII,
            Act::ActII,
            Act::ActII,
            Act::ActIII,
            Act::ActIII,
        ]
    );
}

/// Serialization is deterministic
#[test]
fn test_to_fountain_calledTwice_shouldBeIdentical() -> Result<()> {
    let screenplay = load_document(common::SAMPLE_FDX, DocumentFormat::FinalDraft, &ParserOptions::default())?;

    let first = to_fountain(&screenplay);
    let second = to_fountain(&screenplay);

    assert_eq!(first, second);
    assert!(first.starts_with("INT. DINER - NIGHT\n\nRain streaks the window."));
    assert!(first.contains("MAYA\n\n(quietly)\n\nSalt & pepper. Always both."));
    assert!(first.ends_with("CUT TO:\n"));

    Ok(())
}
