use std::fmt;

const UNKNOWN_LOCATION: &str = "an unknown location";
const UNKNOWN_CROP: &str = "an unknown crop";

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("A question is required")]
pub struct MissingInputError;

/// Location and crop taken from the farmer's session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FarmerContext {
    pub location: Option<String>,
    pub crop: Option<String>,
}

impl FarmerContext {
    pub fn new(location: impl Into<String>, crop: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            crop: Some(crop.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryPrompt(String);

impl AdvisoryPrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdvisoryPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn or_placeholder<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(placeholder)
}

pub fn build(question: &str, context: &FarmerContext) -> Result<AdvisoryPrompt, MissingInputError> {
    if question.trim().is_empty() {
        return Err(MissingInputError);
    }

    let location = or_placeholder(context.location.as_deref(), UNKNOWN_LOCATION);
    let crop = or_placeholder(context.crop.as_deref(), UNKNOWN_CROP);

    Ok(AdvisoryPrompt(format!(
        "You are Krishi Sakhi, an expert agricultural assistant for farmers.\n\
         Provide a clear, concise, and helpful answer to the following question.\n\
         Give advice that is practical and relevant to the farmer's context.\n\
         \n\
         Farmer's Context:\n\
         - Location: {location}\n\
         - Main Crop: {crop}\n\
         \n\
         Farmer's Question:\n\
         \"{question}\"\n\
         \n\
         Answer:\n"
    )))
}
