use crate::Mood;

// Keyword groups checked in a fixed priority order; the first group with a
// keyword appearing as a substring of the tag wins.
const KEYWORD_GROUPS: [(&[&str], Mood); 5] = [
    (&["happy", "joy", "fun", "upbeat"], Mood::Happy),
    (&["sad", "melancholy"], Mood::Sad),
    (&["angry", "aggressive", "hard"], Mood::Angry),
    (&["calm", "ambient", "relax"], Mood::Calm),
    (&["dance", "party", "energetic"], Mood::Energetic),
];

/// Map a classifier tag to a mood, or `None` when the tag names none of the
/// keyword groups and the caller should defer to the fallback stage.
pub fn mood_for_tag(tag: &str) -> Option<Mood> {
    let tag = tag.to_ascii_lowercase();
    KEYWORD_GROUPS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| tag.contains(keyword)))
        .map(|(_, mood)| *mood)
}
