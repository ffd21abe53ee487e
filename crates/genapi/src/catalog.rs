use serde::Serialize;

use crate::types::OperationKind;

/// A ready-made prompt offered next to the prompt box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PredefinedPrompt {
    pub name: &'static str,
    pub value: &'static str,
}

const fn prompt(name: &'static str, value: &'static str) -> PredefinedPrompt {
    PredefinedPrompt { name, value }
}

const GENERATE: &[PredefinedPrompt] = &[
    prompt(
        "Anime",
        "anime style, beautiful, detailed, cinematic lighting",
    ),
    prompt(
        "Photorealistic portrait",
        "photorealistic portrait, 4k, ultra detailed, natural lighting",
    ),
    prompt(
        "Ao Dai student",
        "Vietnamese high school girl wearing a white Ao Dai, riding a bicycle on a sunny street with trees",
    ),
    prompt(
        "Cyberpunk",
        "cyberpunk character, Ho Chi Minh City night scene with neon signs background, futuristic clothing",
    ),
];

const EDIT: &[PredefinedPrompt] = &[
    prompt(
        "Studio shot",
        "professional studio headshot, clean off-white background, soft lighting, high resolution",
    ),
    prompt(
        "Saigon cafe",
        "sitting at a stylish sidewalk cafe in Saigon, drinking iced coffee (cà phê sữa đá), soft morning light",
    ),
    prompt(
        "Hanoi street",
        "street style fashion photo, walking in Hanoi Old Quarter, vibrant background, ancient architecture, candid shot",
    ),
    prompt(
        "Da Nang beach",
        "on the beautiful My Khe beach in Da Nang during sunset, vibrant colors in the sky, gentle waves",
    ),
    prompt(
        "Tet holiday",
        "celebrating Vietnamese Tet holiday, wearing a beautiful red Ao Dai, posing with apricot blossoms (hoa mai) or peach blossoms (hoa đào)",
    ),
    prompt(
        "Ha Long cruise",
        "standing on a cruise ship in Ha Long Bay, surrounded by limestone karsts and emerald green water, majestic scenery",
    ),
];

const SWAP: &[PredefinedPrompt] = &[
    prompt("Big smile", "make the person have a wide, happy smile"),
    prompt("Blue hair", "change the hair color to vibrant blue"),
    prompt("Sunglasses", "add stylish sunglasses to the face"),
    prompt("Younger", "make the person look about 10 years younger"),
];

/// Prompts offered for a mode. Modes driven by fixed actions or by an uploaded image
/// have none.
pub fn predefined_prompts(kind: OperationKind) -> &'static [PredefinedPrompt] {
    match kind {
        OperationKind::Generate => GENERATE,
        OperationKind::Edit => EDIT,
        OperationKind::Swap => SWAP,
        OperationKind::Magic
        | OperationKind::Analyze
        | OperationKind::Suggest
        | OperationKind::Video => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_modes_have_entries() {
        assert_eq!(predefined_prompts(OperationKind::Generate).len(), 4);
        assert_eq!(predefined_prompts(OperationKind::Edit).len(), 6);
        assert_eq!(predefined_prompts(OperationKind::Swap).len(), 4);
        assert!(predefined_prompts(OperationKind::Magic).is_empty());
    }

    #[test]
    fn entries_are_not_blank() {
        for kind in [OperationKind::Generate, OperationKind::Edit, OperationKind::Swap] {
            for entry in predefined_prompts(kind) {
                assert!(!entry.name.trim().is_empty());
                assert!(!entry.value.trim().is_empty());
            }
        }
    }
}
