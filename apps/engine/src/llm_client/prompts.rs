// Cross-cutting prompt fragments shared by more than one call site.
// Each tailoring step defines its own prompts alongside its module.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every tailoring prompt regardless of mode.
/// Fabrication is forbidden even in aggressive mode.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: Do NOT invent employers, titles, dates, degrees, certifications, \
    or achievements that are not present in the original resume. Rewording and \
    reframing existing facts is allowed; adding new facts is not.";

/// Output-format instruction for tailoring calls: plain résumé text only.
pub const PLAIN_TEXT_OUTPUT_INSTRUCTION: &str = "\
    OUTPUT FORMAT: Return ONLY the tailored resume text. \
    Keep the original section headers. \
    Do NOT add commentary, explanations, or notes about what you changed. \
    Do NOT wrap the output in markdown code fences. \
    Do NOT add markers such as [MODIFIED] or [UPDATED].";
