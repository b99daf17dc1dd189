//! Profile edits: partial updates merged over the stored profile.

use reqwest::Url;

use bluejay_core::Role;

use super::AuthError;
use crate::models::{Coordinates, Profile};

const MAX_ADDRESS_LENGTH: usize = 300;
const MAX_ABOUT_LENGTH: usize = 2000;
const MAX_CUISINE_LENGTH: usize = 60;
const MAX_CUISINES: usize = 20;
const MAX_LOCATION_LENGTH: usize = 120;
const MAX_IMAGE_URL_LENGTH: usize = 2048;

/// A partial profile edit.
///
/// `None` leaves a field as stored. A text field that is blank after
/// trimming clears it. Latitude and longitude are only accepted together.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub about_me: Option<String>,
    pub chef_profile: Option<String>,
    pub chef_cuisine: Option<String>,
    pub cuisines: Option<Vec<String>>,
    pub profile_image: Option<String>,
    pub general_location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ProfileUpdate {
    /// Apply the non-identity fields of this edit to `current`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidProfile` naming the first offending field.
    pub fn merge(&self, role: Role, current: Profile) -> Result<Profile, AuthError> {
        let mut profile = current;

        if !role.is_chef() {
            let chef_only = [self.chef_profile.as_deref(), self.chef_cuisine.as_deref()]
                .into_iter()
                .flatten()
                .any(|v| !v.trim().is_empty())
                || self.cuisines.as_ref().is_some_and(|c| !c.is_empty());
            if chef_only {
                return Err(invalid("only chefs can set chef details"));
            }
        }

        merge_text(&mut profile.address, self.address.as_deref(), "address", MAX_ADDRESS_LENGTH)?;
        merge_text(&mut profile.about_me, self.about_me.as_deref(), "aboutMe", MAX_ABOUT_LENGTH)?;
        merge_text(
            &mut profile.chef_profile,
            self.chef_profile.as_deref(),
            "chefProfile",
            MAX_ABOUT_LENGTH,
        )?;
        merge_text(
            &mut profile.chef_cuisine,
            self.chef_cuisine.as_deref(),
            "chefCuisine",
            MAX_CUISINE_LENGTH,
        )?;
        merge_text(
            &mut profile.general_location,
            self.general_location.as_deref(),
            "generalLocation",
            MAX_LOCATION_LENGTH,
        )?;

        if let Some(cuisines) = &self.cuisines {
            profile.cuisines = normalize_cuisines(cuisines)?;
        }

        if let Some(image) = self.profile_image.as_deref() {
            profile.profile_image = check_image_url(image.trim())?;
        }

        match (self.latitude, self.longitude) {
            (None, None) => {}
            (Some(latitude), Some(longitude)) => {
                profile.coordinates = Some(check_coordinates(latitude, longitude)?);
            }
            _ => return Err(invalid("latitude and longitude must be given together")),
        }

        Ok(profile)
    }
}

fn invalid(message: impl Into<String>) -> AuthError {
    AuthError::InvalidProfile(message.into())
}

fn merge_text(
    slot: &mut Option<String>,
    value: Option<&str>,
    field: &str,
    max: usize,
) -> Result<(), AuthError> {
    let Some(value) = value.map(str::trim) else {
        return Ok(());
    };
    if value.chars().count() > max {
        return Err(invalid(format!("{field} must be at most {max} characters")));
    }
    *slot = (!value.is_empty()).then(|| value.to_string());
    Ok(())
}

/// Trim, drop blanks and remove case-insensitive duplicates, keeping the
/// first spelling.
fn normalize_cuisines(raw: &[String]) -> Result<Vec<String>, AuthError> {
    let mut seen: Vec<String> = Vec::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());

    for cuisine in raw.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        if cuisine.chars().count() > MAX_CUISINE_LENGTH {
            return Err(invalid(format!(
                "each cuisine must be at most {MAX_CUISINE_LENGTH} characters"
            )));
        }
        let key = cuisine.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(cuisine.to_string());
    }

    if out.len() > MAX_CUISINES {
        return Err(invalid(format!("at most {MAX_CUISINES} cuisines")));
    }
    Ok(out)
}

fn check_image_url(value: &str) -> Result<Option<String>, AuthError> {
    if value.is_empty() {
        return Ok(None);
    }
    if value.len() > MAX_IMAGE_URL_LENGTH {
        return Err(invalid("profileImage is too long"));
    }
    let url = Url::parse(value).map_err(|_| invalid("profileImage must be a URL"))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid("profileImage must be an http(s) URL"));
    }
    Ok(Some(url.to_string()))
}

fn check_coordinates(latitude: f64, longitude: f64) -> Result<Coordinates, AuthError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(invalid("latitude must be between -90 and 90"));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(invalid("longitude must be between -180 and 180"));
    }
    Ok(Coordinates {
        latitude,
        longitude,
    })
}
