//! Turns an [`OperationRequest`] into the provider call that serves it.
//!
//! All validation happens here, before anything touches the network.

use crate::config::ModelSet;
use crate::error::{GenError, GenResult};
use crate::types::{
    AnalyzeOptions, AspectRatio, EditOptions, GenerateOptions, ImageData, MagicAction,
    MagicOptions, OperationRequest, OutputQuality, Part, SuggestOptions, SuggestionTarget,
    SwapOptions, VideoOptions,
};

pub const MAX_IMAGES_PER_REQUEST: u32 = 4;
pub const MAX_VARIATIONS: u32 = 4;
pub const GENERATED_IMAGE_MIME: &str = "image/jpeg";

/// What the provider should hand back for a content call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Image and text modalities; the first inline image is the result.
    Image,
    Text,
    /// JSON constrained to `{ "suggestions": [string] }`.
    Suggestions,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageGenerationCall {
    pub model: String,
    pub prompt: String,
    pub count: u32,
    pub aspect_ratio: AspectRatio,
    pub output_mime_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentCall {
    pub model: String,
    pub parts: Vec<Part>,
    pub format: ResponseFormat,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoJobCall {
    pub model: String,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub image: Option<ImageData>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderCall {
    /// One call that natively returns `count` images.
    GenerateImages(ImageGenerationCall),
    /// One image per call, repeated `variations` times.
    Edit { call: ContentCall, variations: u32 },
    Describe(ContentCall),
    Suggest(ContentCall),
    Video(VideoJobCall),
}

const CONSISTENCY_INSTRUCTION: &str = "INSTRUCTION: You are an expert at character consistency. \
The images labelled CHARACTER IMAGE show the character to reproduce. Preserve the character's face, \
hair, body shape and every identifying feature with high fidelity. Do not change the character's \
appearance under any circumstances.";

const ANALYZE_INSTRUCTION: &str = "You are an expert prompt engineer. Analyze the following image \
in detail and write a descriptive, high-quality prompt an AI image generator could use to recreate \
a similar image. Describe the subject, their clothing, the setting, the lighting, the atmosphere and \
the artistic style (e.g. photorealistic, anime). Be concise but comprehensive.";

pub fn build(request: &OperationRequest, models: &ModelSet) -> GenResult<ProviderCall> {
    match request {
        OperationRequest::Generate(options) => build_generate(options, models),
        OperationRequest::Edit(options) => build_edit(options, models),
        OperationRequest::Swap(options) => build_swap(options, models),
        OperationRequest::Magic(options) => build_magic(options, models),
        OperationRequest::Analyze(options) => build_analyze(options, models),
        OperationRequest::Suggest(options) => build_suggest(options, models),
        OperationRequest::Video(options) => build_video(options, models),
    }
}

fn build_generate(options: &GenerateOptions, models: &ModelSet) -> GenResult<ProviderCall> {
    let prompt = options.prompt.trim();
    if prompt.is_empty() {
        return Err(GenError::validation("Image prompt cannot be empty."));
    }
    let count = check_count(options.number_of_images, MAX_IMAGES_PER_REQUEST, "Number of images")?;
    let quality = options.quality.unwrap_or_default();

    Ok(ProviderCall::GenerateImages(ImageGenerationCall {
        model: models.image_generation.clone(),
        prompt: format!("{prompt}{}", quality.prompt_suffix()),
        count,
        aspect_ratio: options.aspect_ratio,
        output_mime_type: GENERATED_IMAGE_MIME.to_string(),
    }))
}

fn build_edit(options: &EditOptions, models: &ModelSet) -> GenResult<ProviderCall> {
    if options.character_images.is_empty() {
        return Err(GenError::validation("Upload at least one character image."));
    }
    let variations = check_count(options.number_of_variations, MAX_VARIATIONS, "Number of variations")?;

    let total = options.character_images.len();
    let mut parts = vec![Part::text(CONSISTENCY_INSTRUCTION)];
    for (index, image) in options.character_images.iter().enumerate() {
        let label = format!("Character image {}", index + 1);
        image.validate(&label)?;
        parts.push(Part::text(format!(
            "CHARACTER IMAGE {} of {total}: reference of the character.",
            index + 1
        )));
        parts.push(Part::image(image));
    }
    if let Some(product) = &options.product_image {
        product.validate("Product image")?;
        parts.push(Part::text(
            "PRODUCT IMAGE: The following image is a product to be integrated into the scene.",
        ));
        parts.push(Part::image(product));
    }
    if let Some(background) = &options.background_image {
        background.validate("Background image")?;
        parts.push(Part::text(
            "BACKGROUND IMAGE: The following image is the background the character must be placed in.",
        ));
        parts.push(Part::image(background));
    }

    let quality = options.quality.unwrap_or_default();
    let mut direction = vec![
        format!("SCENE PROMPT: {}.", options.prompt.trim()),
        format!(
            "ASPECT RATIO: The output image must use a {} aspect ratio.",
            options.aspect_ratio.as_str()
        ),
        "ART DIRECTION:".to_string(),
        "- Character realism: create a photorealistic image. The character must be realistically \
         scaled and proportioned relative to the scene, with correct perspective, depth, lighting \
         and shadows so the composition is believable."
            .to_string(),
    ];
    if options.product_image.is_some() {
        direction.push(
            "- Product integration: the character interacts with the product naturally (e.g. a \
             realistic grip). The product's lighting, shadows and reflections must match the scene."
                .to_string(),
        );
    }
    if options.background_image.is_some() {
        direction.push(
            "- Background integration: keep the provided background and match the character's \
             lighting and perspective to it."
                .to_string(),
        );
    }
    direction.push(quality_line(quality));
    direction.push("OUTPUT: Produce exactly one image.".to_string());
    parts.push(Part::text(direction.join("\n")));

    Ok(ProviderCall::Edit {
        call: ContentCall {
            model: models.image_edit.clone(),
            parts,
            format: ResponseFormat::Image,
        },
        variations,
    })
}

fn build_swap(options: &SwapOptions, models: &ModelSet) -> GenResult<ProviderCall> {
    let (Some(source), Some(target)) = (&options.source_face_image, &options.target_image) else {
        return Err(GenError::validation(
            "Upload both a source face image and a target image.",
        ));
    };
    source.validate("Source face image")?;
    target.validate("Target image")?;
    let variations = check_count(options.number_of_variations, MAX_VARIATIONS, "Number of variations")?;

    let quality = options.quality.unwrap_or_default();
    let extra = options.prompt.trim();
    let mut instruction = String::from(
        "INSTRUCTION: Take the face from IMAGE 1 and blend it onto the person in IMAGE 2. \
         Preserve everything else about IMAGE 2 exactly: background, lighting, pose, clothing, \
         hair and body. Only the face changes. The result must look realistic and seamless. ",
    );
    instruction.push_str(&quality_line(quality));
    if !extra.is_empty() {
        instruction.push_str(&format!(" Additional user instructions: {extra}"));
    }
    instruction.push_str(" Produce exactly one image.");

    let parts = vec![
        Part::text("IMAGE 1: This is the source face."),
        Part::image(source),
        Part::text("IMAGE 2: This is the target image where the face should be placed."),
        Part::image(target),
        Part::text(instruction),
    ];

    Ok(ProviderCall::Edit {
        call: ContentCall {
            model: models.image_edit.clone(),
            parts,
            format: ResponseFormat::Image,
        },
        variations,
    })
}

fn build_magic(options: &MagicOptions, models: &ModelSet) -> GenResult<ProviderCall> {
    let Some(image) = &options.image else {
        return Err(GenError::validation("Upload an image to edit."));
    };
    image.validate("Image")?;

    let prompt = options.prompt.as_deref().map(str::trim).unwrap_or("");
    if options.action.requires_prompt() && prompt.is_empty() {
        return Err(GenError::validation(
            "Describe the object or background for this action.",
        ));
    }

    let quality = options.quality.unwrap_or_default();
    let instruction = format!(
        "{} {}",
        magic_instruction(options.action, prompt),
        quality_line(quality)
    );

    Ok(ProviderCall::Edit {
        call: ContentCall {
            model: models.image_edit.clone(),
            parts: vec![Part::image(image), Part::text(instruction)],
            format: ResponseFormat::Image,
        },
        variations: 1,
    })
}

/// Instruction table for one-click edits. `prompt` is only used by the actions that
/// require it.
pub fn magic_instruction(action: MagicAction, prompt: &str) -> String {
    match action {
        MagicAction::Upscale => "Upscale this image to a higher resolution, enhance details and \
            improve overall quality. Make the image sharper and clearer."
            .to_string(),
        MagicAction::RemoveBackground => "Remove the background of this image perfectly, leaving \
            only the main subject. The output should have a transparent background."
            .to_string(),
        MagicAction::ColorCorrect => "Correct the colors, contrast and brightness of this image \
            so it looks vibrant, professional and balanced."
            .to_string(),
        MagicAction::RemoveObject => format!(
            "Carefully remove the object described as \"{prompt}\" from this image. Inpaint the \
             area so it blends seamlessly and realistically with its surroundings, as if the \
             object was never there."
        ),
        MagicAction::ChangeBackground => format!(
            "INSTRUCTION: You are a professional photo editor performing a background \
             replacement. 1. Identify the primary subject(s). 2. Isolate them perfectly without \
             altering their appearance, color or form. 3. Remove the original background \
             completely. 4. Generate a new photorealistic background from this description: \
             \"{prompt}\". 5. Integrate the subject(s) seamlessly, matching lighting, shadows, \
             reflections and perspective so the result reads as one photograph."
        ),
        MagicAction::BeautifyPortrait => "Perform a professional portrait retouch on this image. \
            Subtly smooth the skin while keeping natural texture, brighten the eyes, gently whiten \
            visible teeth and make the lighting more flattering. The result must look natural, \
            not artificial."
            .to_string(),
    }
}

fn build_analyze(options: &AnalyzeOptions, models: &ModelSet) -> GenResult<ProviderCall> {
    let Some(image) = &options.image else {
        return Err(GenError::validation("Upload an image to analyze."));
    };
    image.validate("Image")?;

    Ok(ProviderCall::Describe(ContentCall {
        model: models.text.clone(),
        parts: vec![Part::text(ANALYZE_INSTRUCTION), Part::image(image)],
        format: ResponseFormat::Text,
    }))
}

fn build_suggest(options: &SuggestOptions, models: &ModelSet) -> GenResult<ProviderCall> {
    let prompt = options.prompt.trim();
    if options.target == SuggestionTarget::VideoIdea && options.images.is_empty() {
        return Err(GenError::validation(
            "Video ideas need the image that will be animated.",
        ));
    }

    let instruction = match options.target {
        SuggestionTarget::Prompt => {
            "You help users write prompts for an AI image generator. Propose exactly three \
             improved, distinct prompt ideas that build on the user's idea and any reference \
             images. Each idea is a single vivid sentence."
        }
        SuggestionTarget::VideoIdea => {
            "You help users turn a still image into a short video clip. Propose exactly three \
             distinct ideas describing camera movement and subject motion that suit the image. \
             Each idea is a single sentence usable as a video generation prompt."
        }
    };

    let mut parts = vec![Part::text(instruction)];
    if prompt.is_empty() {
        parts.push(Part::text("The user has not written an idea yet."));
    } else {
        parts.push(Part::text(format!("User idea: {prompt}")));
    }
    for (index, image) in options.images.iter().enumerate() {
        image.validate(&format!("Reference image {}", index + 1))?;
        parts.push(Part::image(image));
    }
    parts.push(Part::text(
        "Respond with JSON of the form {\"suggestions\": [\"...\", \"...\", \"...\"]}.",
    ));

    Ok(ProviderCall::Suggest(ContentCall {
        model: models.text.clone(),
        parts,
        format: ResponseFormat::Suggestions,
    }))
}

fn build_video(options: &VideoOptions, models: &ModelSet) -> GenResult<ProviderCall> {
    let prompt = options.prompt.trim();
    if prompt.is_empty() {
        return Err(GenError::validation("Video prompt cannot be empty."));
    }
    if !options.aspect_ratio.supports_video() {
        return Err(GenError::validation(format!(
            "Videos support 16:9 or 9:16, not {}.",
            options.aspect_ratio.as_str()
        )));
    }
    if let Some(image) = &options.image {
        image.validate("Seed image")?;
    }

    Ok(ProviderCall::Video(VideoJobCall {
        model: models.video.clone(),
        prompt: prompt.to_string(),
        aspect_ratio: options.aspect_ratio,
        image: options.image.clone(),
    }))
}

fn quality_line(quality: OutputQuality) -> String {
    let suffix = quality.prompt_suffix().trim_start_matches(", ");
    let descriptor = if suffix.is_empty() {
        "standard quality"
    } else {
        suffix
    };
    format!("QUALITY: The final image must be of high quality, reflecting these characteristics: {descriptor}.")
}

fn check_count(value: u32, max: u32, label: &str) -> GenResult<u32> {
    if value == 0 || value > max {
        return Err(GenError::validation(format!(
            "{label} must be between 1 and {max}."
        )));
    }
    Ok(value)
}
