//! Prompt Templates
//!
//! Every completion call sends a two-part message: a shared system prompt
//! describing the summary format, plus a per-phase instruction describing
//! what this pass must do. The builders here own all of that text so the
//! strategy executors never assemble prompts inline.

use crate::types::DocumentProfile;

/// Shared system prompt for every summarization pass
pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You are an expert academic analyst specializing in distilling complex documents into clear, structured summaries for researchers and professionals. Provide a comprehensive yet concise summary of the provided document text.

The summary should be formatted in Markdown with clear headings and logical spacing for optimal readability. Focus on accuracy, depth, and clarity, identifying the core arguments, methodology (if applicable), evidence, findings, and conclusions of the document. The summary should be detailed enough to provide a solid understanding of the document's content without reading it in full, while also serving as a guide for deeper reading.

Output structure and formatting guidelines:

* Use Markdown for all formatting.
* Section titles should be **bolded** and followed by a blank line for spacing.
* Use bullet points ('*' or '-') for lists of key findings, arguments, and limitations.
* Use paragraphs for descriptive sections such as the abstract, discussion, and implications.
* Maintain a formal, objective, and analytical tone throughout.
* Do NOT use emojis.

Structure the summary as follows, adapting sections to the document type:

**Concise Title of the Document**

**Abstract / Executive Summary**
(A succinct overview of the document's main purpose, scope, key findings, and conclusions.)

**Research Problem / Objectives**
(The main problem the document addresses or the questions it aims to answer.)

**Methodology / Approach**
(If applicable, the methodology, framework, or structural approach used.)

**Key Findings / Core Arguments**
(The main findings or central arguments, as bullet points, including key data.)

**Discussion / Interpretation**
(The significance of the findings and how the author interprets them.)

**Limitations / Gaps Identified**
(Limitations acknowledged by the authors or gaps the document highlights.)

**Key Concepts & Definitions**
(Central concepts or specialized terminology crucial for understanding.)

**Overall Conclusion & Main Takeaway**
(A final, concise statement of the most important takeaway.)"#;

/// Rendered two-part message for one completion call
#[derive(Debug, Clone)]
pub struct MessagePair {
    pub system: String,
    pub user: String,
}

/// Join the shared system prompt with a per-phase instruction and attach the
/// content as the user message
pub fn compose(instruction: &str, content: &str) -> MessagePair {
    MessagePair {
        system: format!("{SUMMARY_SYSTEM_PROMPT}\n\n{instruction}"),
        user: content.to_string(),
    }
}

fn topics_preview(profile: &DocumentProfile, count: usize) -> String {
    profile
        .key_topics
        .iter()
        .take(count)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}

/// Instruction for summarizing an entire document in one request
pub fn single_pass_instruction(profile: &DocumentProfile) -> String {
    format!(
        "You are analyzing a {}-page document with {} complexity and {} sections. Create a comprehensive, well-structured summary that captures ALL key information while maintaining excellent readability.\n\n\
         CRITICAL REQUIREMENTS:\n\
         - Cover ALL major topics and subtopics comprehensively\n\
         - Preserve important details, data points, and specific information\n\
         - Maintain logical flow matching the original document structure\n\
         - Use clear markdown formatting with appropriate headings\n\
         - Include key findings, conclusions, and recommendations\n\
         - Preserve technical terms and domain-specific language\n\
         - Aim for 10-15% of original length while maximizing information density\n\n\
         Key topics identified: {}\n\n\
         Structure your summary with:\n\
         1. Executive Overview\n\
         2. Main sections mirroring document structure\n\
         3. Key findings and data points\n\
         4. Important conclusions/recommendations",
        profile.estimated_pages,
        profile.complexity.as_str(),
        profile.structural_elements.headers,
        topics_preview(profile, 8),
    )
}

/// Instruction for one MAP-phase chunk of a map-reduce run
pub fn map_instruction(part: usize, total: usize, profile: &DocumentProfile) -> String {
    format!(
        "Summarize this section (part {part} of {total}) of a {}-page {} document. This is the MAP phase - create a detailed summary preserving ALL important information.\n\n\
         REQUIREMENTS:\n\
         - Extract and preserve ALL key points, data, and specific details\n\
         - Maintain context for cross-references and themes spanning sections\n\
         - Use structured format with clear headings\n\
         - Include technical details, numbers, quotes, and specific information\n\
         - Note connections to broader document themes\n\
         - Preserve important terminology and domain language\n\n\
         Document context: Topics include {}",
        profile.estimated_pages,
        profile.complexity.as_str(),
        topics_preview(profile, 5),
    )
}

/// Instruction for the REDUCE synthesis over all chunk summaries
pub fn reduce_instruction(section_count: usize, profile: &DocumentProfile) -> String {
    format!(
        "Create the final comprehensive summary from these {section_count} detailed section summaries of a {}-page document. This is the REDUCE phase - synthesize into one cohesive, complete summary.\n\n\
         CRITICAL REQUIREMENTS:\n\
         - Integrate ALL sections into one seamless, well-structured document\n\
         - Eliminate redundancy while preserving ALL unique information\n\
         - Maintain chronological/logical flow from original document\n\
         - Use clear markdown structure with appropriate headings\n\
         - Ensure no important details are lost in synthesis\n\
         - Cross-reference related topics from different sections\n\
         - Create executive overview + detailed sections\n\
         - Preserve data points, statistics, and specific findings\n\n\
         Final summary should be comprehensive yet readable, capturing the complete scope of the original document.",
        profile.estimated_pages,
    )
}

/// Instruction for one LEVEL-1 chunk of a hierarchical run
pub fn level1_instruction(part: usize, total: usize, profile: &DocumentProfile) -> String {
    format!(
        "Summarize this section (part {part} of {total}) of a {}-page {} document. Create a detailed summary preserving ALL important information.\n\n\
         REQUIREMENTS:\n\
         - Capture ALL key points, data points, and specific details\n\
         - Maintain all significant information and important context\n\
         - Preserve all proper nouns, technical terms, and specific references\n\
         - Include numeric data, statistics, and quantitative information\n\
         - Keep chronological or logical structure of the original\n\
         - Note any critical findings or conclusions\n\
         - Preserve domain-specific terminology and concepts\n\n\
         Document context: Topics include {}",
        profile.estimated_pages,
        profile.complexity.as_str(),
        topics_preview(profile, 5),
    )
}

/// Instruction for one LEVEL-2 batch synthesis
pub fn level2_instruction(batch_len: usize, profile: &DocumentProfile) -> String {
    format!(
        "Create a cohesive summary from these {batch_len} related sections of a {}-page document.\n\n\
         REQUIREMENTS:\n\
         - Synthesize these sections into one unified summary\n\
         - Maintain ALL key information from each section\n\
         - Eliminate redundancy while preserving unique details\n\
         - Ensure logical flow and proper transitions\n\
         - Maintain hierarchical structure with clear headings\n\
         - Cross-reference related information between sections\n\n\
         This is an intermediate synthesis for a multi-level summarization process.",
        profile.estimated_pages,
    )
}

/// Instruction for the LEVEL-3 final integration
pub fn level3_instruction(section_count: usize, profile: &DocumentProfile) -> String {
    format!(
        "Create the final comprehensive summary from these {section_count} major sections of a {}-page {} document.\n\n\
         CRITICAL REQUIREMENTS:\n\
         - Synthesize ALL sections into one seamless, well-structured document\n\
         - Preserve ALL key information, data points, and unique insights\n\
         - Create a logical flow that mirrors the original document structure\n\
         - Use clear markdown formatting with appropriate hierarchical headings\n\
         - Include an executive overview at the beginning\n\
         - Maintain critical details, statistics, and specific references\n\
         - Ensure cross-topic integration and highlight relationships between sections\n\n\
         The final summary should be comprehensive yet clear, capturing the complete scope and insights of the original document.",
        profile.estimated_pages,
        profile.complexity.as_str(),
    )
}

/// Instruction for the optional executive refinement pass
pub fn refinement_instruction() -> String {
    "Refine this comprehensive summary into a clear, professional executive overview while preserving all key information. This should be highly readable for professionals and executives.\n\n\
     REFINEMENT OBJECTIVES:\n\
     - Enhance clarity and readability without losing substance\n\
     - Improve flow and logical organization\n\
     - Strengthen executive-level insights and implications\n\
     - Maintain all critical data points and findings\n\
     - Use professional, executive-appropriate language\n\
     - Ensure actionable insights are clearly highlighted\n\n\
     The refined summary should be as informative as the original but significantly more polished and executive-ready."
        .to_string()
}
