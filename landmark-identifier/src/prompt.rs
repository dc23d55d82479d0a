use crate::types::Candidate;

/// Instruction for the identification call. The image travels as a separate
/// inline part right after this text.
pub fn identification_instruction(max_candidates: usize) -> String {
    let mut text = String::from(
        "You are an expert in landmark recognition.\n\n\
         You will identify the landmark in the provided image and provide its name \
         and a confidence score (0-1).\n",
    );

    if max_candidates > 1 {
        text.push_str(&format!(
            "\nIf other landmarks are also plausible, list up to {} of them in `alternatives`, \
             most likely first, each with its own confidence score (0-1).\n",
            max_candidates - 1
        ));
        text.push_str(
            "\nRespond with a single JSON object with the fields `landmarkName` (string), \
             `confidence` (number between 0 and 1) and `alternatives` (array of objects with \
             `landmarkName` and `confidenceScore`, possibly empty). Do not add any other text.\n",
        );
    } else {
        text.push_str(
            "\nRespond with a single JSON object with the fields `landmarkName` (string) and \
             `confidence` (number between 0 and 1). Do not add any other text.\n",
        );
    }
    text
}

/// Instruction for the clarification call. Candidates are listed in the
/// order given.
pub fn clarification_instruction(candidates: &[Candidate]) -> String {
    let mut text = String::from(
        "Based on the photo, I was able to narrow it down to a few possible landmarks. \
         Could you confirm which one it is?\n\n\
         Here are the possible matches:\n",
    );

    for candidate in candidates {
        text.push_str(&format!(
            "  - {} (Confidence: {})\n",
            candidate.name,
            candidate.confidence.value()
        ));
    }

    text.push_str(
        "\nPlease select the correct landmark from the list above. Respond with a JSON object \
         whose only field `selectedLandmark` is the landmark name copied exactly as written in \
         the list. Do not add any additional information.\n",
    );
    text
}
