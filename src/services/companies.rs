//! Company registration, user login, and restaurant settings.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{info, instrument};

use crate::auth::AuthService;
use crate::db::DbPool;
use crate::entities::{company, company_business_hour, user};
use crate::errors::ServiceError;

/// Fields for registering a restaurant with its first user.
#[derive(Debug, Clone)]
pub struct Registration {
    pub company_name: String,
    pub public_menu_card_url: String,
    pub user_name: String,
    pub email: String,
    pub password: String,
}

/// Settings a restaurant can change after registration.
#[derive(Debug, Default, Clone)]
pub struct CompanySettings {
    pub name: Option<String>,
    pub public_menu_card_url: Option<String>,
    pub show_menu_images: Option<bool>,
    pub show_out_of_stock_menus_on_card: Option<bool>,
}

/// One opening range submitted when replacing a company's weekly schedule.
#[derive(Debug, Clone)]
pub struct BusinessHourInput {
    /// 1 (Monday) through 7 (Sunday).
    pub day_of_week: i32,
    /// `HH:MM`, 24-hour clock.
    pub opens_at: String,
    pub closes_at: String,
    /// Marks a range that closes on the following day.
    pub is_overnight: bool,
}

#[derive(Clone)]
pub struct CompanyService {
    db: Arc<DbPool>,
    auth: AuthService,
}

impl CompanyService {
    pub fn new(db: Arc<DbPool>, auth: AuthService) -> Self {
        Self { db, auth }
    }

    /// Creates a company and its first user in one transaction, returning
    /// both with a fresh token.
    #[instrument(skip(self, registration))]
    pub async fn register(
        &self,
        registration: Registration,
    ) -> Result<(company::Model, user::Model, String), ServiceError> {
        validate_slug(&registration.public_menu_card_url)?;
        if registration.company_name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Company name cannot be empty".to_string(),
            ));
        }
        if registration.user_name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "User name cannot be empty".to_string(),
            ));
        }
        if !registration.email.contains('@') {
            return Err(ServiceError::ValidationError(
                "Email address is invalid".to_string(),
            ));
        }
        if registration.password.len() < 8 {
            return Err(ServiceError::ValidationError(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let slug_taken = company::Entity::find()
            .filter(company::Column::PublicMenuCardUrl.eq(&registration.public_menu_card_url))
            .count(&txn)
            .await?;
        if slug_taken > 0 {
            return Err(ServiceError::Conflict(format!(
                "The public URL '{}' is already taken",
                registration.public_menu_card_url
            )));
        }
        let email_taken = user::Entity::find()
            .filter(user::Column::Email.eq(&registration.email))
            .count(&txn)
            .await?;
        if email_taken > 0 {
            return Err(ServiceError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let company = company::ActiveModel {
            name: Set(registration.company_name),
            public_menu_card_url: Set(registration.public_menu_card_url),
            show_menu_images: Set(true),
            show_out_of_stock_menus_on_card: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let password_hash = self.auth.hash_password(&registration.password)?;
        let user = user::ActiveModel {
            company_id: Set(company.id),
            name: Set(registration.user_name),
            email: Set(registration.email),
            password_hash: Set(password_hash),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        let token = self.auth.generate_token(&user)?;
        info!("Registered company {} with user {}", company.id, user.id);
        Ok((company, user, token))
    }

    /// Checks credentials and issues a token.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(user::Model, String), ServiceError> {
        let user = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::AuthError("Invalid credentials".to_string()))?;

        if !self.auth.verify_password(password, &user.password_hash)? {
            return Err(ServiceError::AuthError("Invalid credentials".to_string()));
        }

        let token = self.auth.generate_token(&user)?;
        Ok((user, token))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, company_id: i32) -> Result<company::Model, ServiceError> {
        company::Entity::find_by_id(company_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Company {} not found", company_id)))
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: i32) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))
    }

    /// Applies restaurant settings, keeping the public URL unique.
    #[instrument(skip(self, settings))]
    pub async fn update_settings(
        &self,
        company_id: i32,
        settings: CompanySettings,
    ) -> Result<company::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = company::Entity::find_by_id(company_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Company {} not found", company_id)))?;

        let mut active: company::ActiveModel = existing.into();
        if let Some(name) = settings.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Company name cannot be empty".to_string(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(slug) = settings.public_menu_card_url {
            validate_slug(&slug)?;
            let taken = company::Entity::find()
                .filter(company::Column::PublicMenuCardUrl.eq(&slug))
                .filter(company::Column::Id.ne(company_id))
                .count(&txn)
                .await?;
            if taken > 0 {
                return Err(ServiceError::Conflict(format!(
                    "The public URL '{}' is already taken",
                    slug
                )));
            }
            active.public_menu_card_url = Set(slug);
        }
        if let Some(show_menu_images) = settings.show_menu_images {
            active.show_menu_images = Set(show_menu_images);
        }
        if let Some(show_out_of_stock) = settings.show_out_of_stock_menus_on_card {
            active.show_out_of_stock_menus_on_card = Set(show_out_of_stock);
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Lists the company's opening ranges ordered by day, then by the
    /// within-day sequence.
    #[instrument(skip(self))]
    pub async fn business_hours(
        &self,
        company_id: i32,
    ) -> Result<Vec<company_business_hour::Model>, ServiceError> {
        let hours = company_business_hour::Entity::find()
            .filter(company_business_hour::Column::CompanyId.eq(company_id))
            .order_by_asc(company_business_hour::Column::DayOfWeek)
            .order_by_asc(company_business_hour::Column::Sequence)
            .all(&*self.db)
            .await?;
        Ok(hours)
    }

    /// Replaces the whole weekly schedule in one transaction. Ranges are
    /// validated together so overlaps across the submitted set, including
    /// overnight spillover into the next day, are rejected.
    #[instrument(skip(self, hours))]
    pub async fn replace_business_hours(
        &self,
        company_id: i32,
        hours: Vec<BusinessHourInput>,
    ) -> Result<Vec<company_business_hour::Model>, ServiceError> {
        validate_business_hours(&hours)?;

        let txn = self.db.begin().await?;
        company::Entity::find_by_id(company_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Company {} not found", company_id)))?;

        company_business_hour::Entity::delete_many()
            .filter(company_business_hour::Column::CompanyId.eq(company_id))
            .exec(&txn)
            .await?;

        // Within a day, ranges are numbered by opening time so the card can
        // render them in order.
        let mut by_day: BTreeMap<i32, Vec<BusinessHourInput>> = BTreeMap::new();
        for hour in hours {
            by_day.entry(hour.day_of_week).or_default().push(hour);
        }

        let now = Utc::now();
        let mut models = Vec::new();
        for ranges in by_day.into_values() {
            let mut ranges = ranges;
            ranges.sort_by_key(|range| minutes_of(&range.opens_at).unwrap_or(0));
            for (index, range) in ranges.into_iter().enumerate() {
                let opens = minutes_of(&range.opens_at).unwrap_or(0);
                let closes = minutes_of(&range.closes_at).unwrap_or(0);
                models.push(company_business_hour::ActiveModel {
                    company_id: Set(company_id),
                    day_of_week: Set(range.day_of_week),
                    opens_at: Set(range.opens_at),
                    closes_at: Set(range.closes_at),
                    is_overnight: Set(range.is_overnight || closes < opens),
                    sequence: Set(index as i32 + 1),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                });
            }
        }
        if !models.is_empty() {
            company_business_hour::Entity::insert_many(models)
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;

        self.business_hours(company_id).await
    }
}

/// Parses an `HH:MM` time into minutes past midnight.
fn minutes_of(time: &str) -> Option<i32> {
    let (hours, minutes) = time.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    Some(hours * 60 + minutes)
}

const MINUTES_PER_DAY: i32 = 24 * 60;
const MINUTES_PER_WEEK: i32 = 7 * MINUTES_PER_DAY;

fn validate_business_hours(hours: &[BusinessHourInput]) -> Result<(), ServiceError> {
    // Each range becomes an absolute minute interval within the week so
    // overlaps can be checked with one sorted sweep.
    let mut intervals = Vec::with_capacity(hours.len());
    for hour in hours {
        if !(1..=7).contains(&hour.day_of_week) {
            return Err(ServiceError::ValidationError(
                "Day of week must be between 1 (Monday) and 7 (Sunday)".to_string(),
            ));
        }
        let opens = minutes_of(&hour.opens_at).ok_or_else(|| {
            ServiceError::ValidationError(
                "Opening time must use the HH:MM 24-hour format".to_string(),
            )
        })?;
        let closes = minutes_of(&hour.closes_at).ok_or_else(|| {
            ServiceError::ValidationError(
                "Closing time must use the HH:MM 24-hour format".to_string(),
            )
        })?;
        if opens == closes {
            return Err(ServiceError::ValidationError(
                "Opening and closing times cannot be equal".to_string(),
            ));
        }
        if closes < opens && !hour.is_overnight {
            return Err(ServiceError::ValidationError(format!(
                "Range {}-{} closes before it opens; mark it as overnight",
                hour.opens_at, hour.closes_at
            )));
        }
        let start = (hour.day_of_week - 1) * MINUTES_PER_DAY + opens;
        let overnight = hour.is_overnight || closes < opens;
        let end =
            (hour.day_of_week - 1) * MINUTES_PER_DAY + closes + overnight as i32 * MINUTES_PER_DAY;
        intervals.push((start, end));
    }

    intervals.sort_unstable();
    for pair in intervals.windows(2) {
        if pair[1].0 < pair[0].1 {
            return Err(ServiceError::ValidationError(
                "Business hours cannot overlap".to_string(),
            ));
        }
    }
    // An overnight Sunday range wraps into Monday.
    if let (Some(first), Some(last)) = (intervals.first(), intervals.last()) {
        if intervals.len() > 1 && first.0 + MINUTES_PER_WEEK < last.1 {
            return Err(ServiceError::ValidationError(
                "Business hours cannot overlap".to_string(),
            ));
        }
    }
    Ok(())
}

/// The public URL is a path segment; keep it lowercase alphanumerics,
/// hyphens, and underscores.
fn validate_slug(slug: &str) -> Result<(), ServiceError> {
    if slug.is_empty() || slug.len() > 64 {
        return Err(ServiceError::ValidationError(
            "Public URL must be between 1 and 64 characters".to_string(),
        ));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(ServiceError::ValidationError(
            "Public URL may only contain lowercase letters, digits, '-' and '_'".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_validation() {
        assert!(validate_slug("chez-marcel_1").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Chez Marcel").is_err());
        assert!(validate_slug("café").is_err());
    }

    fn range(day: i32, opens: &str, closes: &str, overnight: bool) -> BusinessHourInput {
        BusinessHourInput {
            day_of_week: day,
            opens_at: opens.to_string(),
            closes_at: closes.to_string(),
            is_overnight: overnight,
        }
    }

    #[test]
    fn time_parsing() {
        assert_eq!(minutes_of("00:00"), Some(0));
        assert_eq!(minutes_of("23:59"), Some(23 * 60 + 59));
        assert_eq!(minutes_of("24:00"), None);
        assert_eq!(minutes_of("12:60"), None);
        assert_eq!(minutes_of("9:30"), None);
        assert_eq!(minutes_of("noonish"), None);
    }

    #[test]
    fn split_shifts_on_one_day_are_valid() {
        let hours = vec![
            range(1, "11:30", "14:00", false),
            range(1, "18:00", "23:00", false),
        ];
        assert!(validate_business_hours(&hours).is_ok());
    }

    #[test]
    fn equal_open_and_close_rejected() {
        let hours = vec![range(2, "12:00", "12:00", false)];
        assert!(validate_business_hours(&hours).is_err());
    }

    #[test]
    fn close_before_open_requires_overnight_flag() {
        let hours = vec![range(5, "18:00", "02:00", false)];
        assert!(validate_business_hours(&hours).is_err());
        let hours = vec![range(5, "18:00", "02:00", true)];
        assert!(validate_business_hours(&hours).is_ok());
    }

    #[test]
    fn overlapping_ranges_rejected() {
        let hours = vec![
            range(3, "11:00", "15:00", false),
            range(3, "14:00", "22:00", false),
        ];
        assert!(validate_business_hours(&hours).is_err());
    }

    #[test]
    fn overnight_spills_into_next_day() {
        // Friday night service running until 02:00 collides with a Saturday
        // range opening at 01:00.
        let hours = vec![
            range(5, "18:00", "02:00", true),
            range(6, "01:00", "05:00", false),
        ];
        assert!(validate_business_hours(&hours).is_err());
    }

    #[test]
    fn overnight_sunday_wraps_into_monday() {
        let hours = vec![
            range(7, "20:00", "03:00", true),
            range(1, "02:00", "06:00", false),
        ];
        assert!(validate_business_hours(&hours).is_err());
        let hours = vec![
            range(7, "20:00", "03:00", true),
            range(1, "04:00", "06:00", false),
        ];
        assert!(validate_business_hours(&hours).is_ok());
    }

    #[test]
    fn day_out_of_range_rejected() {
        assert!(validate_business_hours(&[range(0, "09:00", "17:00", false)]).is_err());
        assert!(validate_business_hours(&[range(8, "09:00", "17:00", false)]).is_err());
    }
}
