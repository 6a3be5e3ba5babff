use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct Location {
    pub city: String,
    pub country: String,
}

/// ホテル
///
/// features はDB上ではカンマ区切りの1カラム（TEXT）。
/// 書き込み時に `,` で結合し、読み込み時に `,` で分割する（対称であること）。
#[derive(Debug, Serialize)]
pub struct Hotel {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub location: Location,
    pub image_url: String,
    pub price_per_night: f64,
    pub rating: f64,
    pub phone_number: String,
    pub features: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Hotel {
    /// features をDBカラム形式（カンマ区切り）へ
    pub fn join_features(features: &[String]) -> String {
        features.join(",")
    }

    /// DBカラム形式（カンマ区切り）から features へ
    pub fn split_features(column: &str) -> Vec<String> {
        column
            .split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// ホテル一覧のフィルター・ソート・ページネーションパラメータ
///
/// クエリ文字列からデシリアライズされる（外部向けは camelCase）。
/// 使用前に必ず `validate()` で正規化すること。
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HotelFilter {
    pub page: i64,
    pub page_size: i64,
    pub sort_by: String,
    pub sort_order: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub search: Option<String>,
    pub min_price: f64,
    pub max_price: f64,
    pub min_rating: f64,
    /// カンマ区切りの設備タグ（例: "wifi,pool"）
    pub features: Option<String>,
}

const DEFAULT_PAGE_SIZE: i64 = 5;
const MAX_PAGE_SIZE: i64 = 50;
const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;
const DEFAULT_SORT_BY: &str = "name";

impl Default for HotelFilter {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: DEFAULT_SORT_BY.to_string(),
            sort_order: "asc".to_string(),
            city: None,
            country: None,
            search: None,
            min_price: 0.0,
            max_price: 0.0,
            min_rating: 0.0,
            features: None,
        }
    }
}

impl HotelFilter {
    /// パラメータを使用可能な値域へ正規化する
    ///
    /// # Note
    /// max_price == 0 は「上限なし」として f64::MAX に置き換える。
    /// 明示的な上限ゼロと未指定は区別できない（既知の仕様）。
    pub fn validate(&mut self) {
        if self.page <= 0 {
            self.page = 1;
        }
        // page * page_size が i64 を溢れない範囲に収める
        if self.page > MAX_PAGE {
            self.page = MAX_PAGE;
        }
        if self.page_size <= 0 || self.page_size >= MAX_PAGE_SIZE {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        if self.sort_by.trim().is_empty() {
            self.sort_by = DEFAULT_SORT_BY.to_string();
        }
        if self.min_price < 0.0 {
            self.min_price = 0.0;
        }
        if self.max_price == 0.0 {
            self.max_price = f64::MAX;
        }
        self.sort_order = match self.sort_order.to_lowercase().as_str() {
            "desc" => "DESC".to_string(),
            _ => "ASC".to_string(),
        };
    }

    /// 設備タグの正規化: trim・小文字化・空要素除去・重複排除
    ///
    /// 重複排除にセットを使うため順序は保証しない。
    pub fn normalize_features(raw: &[String]) -> Vec<String> {
        let unique: HashSet<String> = raw
            .iter()
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
        unique.into_iter().collect()
    }

    /// クエリ文字列のカンマ区切りタグを正規化済みのリストへ
    pub fn normalized_features(&self) -> Vec<String> {
        match &self.features {
            Some(raw) => {
                let parts: Vec<String> = raw.split(',').map(str::to_string).collect();
                Self::normalize_features(&parts)
            }
            None => Vec::new(),
        }
    }

    /// 外部向けフィールド名（camelCase）をDBカラム名（snake_case）へ変換
    ///
    /// ORDER BY 句はバインドできないため、許可リスト方式で変換する。
    /// 未知のフィールドは name にフォールバック。
    pub fn sort_column(&self) -> &'static str {
        match self.sort_by.as_str() {
            "name" => "name",
            "city" => "city",
            "country" => "country",
            "rating" => "rating",
            "pricePerNight" => "price_per_night",
            "createdAt" => "created_at",
            _ => "name",
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_defaults() {
        let mut filter = HotelFilter {
            page: 0,
            page_size: 0,
            max_price: 0.0,
            ..HotelFilter::default()
        };
        filter.validate();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.page_size, 5);
        assert_eq!(filter.max_price, f64::MAX);
    }

    #[test]
    fn test_validate_huge_page_does_not_overflow_offset() {
        let mut filter = HotelFilter {
            page: i64::MAX,
            page_size: 50,
            ..HotelFilter::default()
        };
        filter.validate();
        assert!(filter.offset() >= 0);

        // validate() を通さない値でも offset() 自体はパニックしない
        let filter = HotelFilter {
            page: i64::MAX,
            page_size: 50,
            ..HotelFilter::default()
        };
        assert_eq!(filter.offset(), i64::MAX);
    }

    #[test]
    fn test_validate_page_size_upper_bound() {
        let mut filter = HotelFilter {
            page_size: 50,
            ..HotelFilter::default()
        };
        filter.validate();
        assert_eq!(filter.page_size, 5);
    }

    #[test]
    fn test_validate_negative_min_price() {
        let mut filter = HotelFilter {
            min_price: -10.0,
            ..HotelFilter::default()
        };
        filter.validate();
        assert_eq!(filter.min_price, 0.0);
    }

    #[test]
    fn test_validate_empty_sort_by_falls_back_to_name() {
        let mut filter = HotelFilter {
            sort_by: "  ".to_string(),
            ..HotelFilter::default()
        };
        filter.validate();
        assert_eq!(filter.sort_by, "name");
    }

    #[test]
    fn test_validate_sort_order_whitelist() {
        let mut filter = HotelFilter {
            sort_order: "DESC".to_string(),
            ..HotelFilter::default()
        };
        filter.validate();
        assert_eq!(filter.sort_order, "DESC");

        let mut filter = HotelFilter {
            sort_order: "desc; DROP TABLE hotels".to_string(),
            ..HotelFilter::default()
        };
        filter.validate();
        assert_eq!(filter.sort_order, "ASC");
    }

    #[test]
    fn test_normalize_features_dedup() {
        let raw = vec!["Spa".to_string(), " spa".to_string(), "Pool".to_string()];
        let normalized = HotelFilter::normalize_features(&raw);
        assert_eq!(normalized.len(), 2);
        assert!(normalized.contains(&"spa".to_string()));
        assert!(normalized.contains(&"pool".to_string()));
    }

    #[test]
    fn test_normalize_features_drops_empty() {
        let raw = vec!["".to_string(), "  ".to_string(), "wifi".to_string()];
        let normalized = HotelFilter::normalize_features(&raw);
        assert_eq!(normalized, vec!["wifi".to_string()]);
    }

    #[test]
    fn test_sort_column_camel_case_mapping() {
        let filter = HotelFilter {
            sort_by: "pricePerNight".to_string(),
            ..HotelFilter::default()
        };
        assert_eq!(filter.sort_column(), "price_per_night");

        let filter = HotelFilter {
            sort_by: "createdAt".to_string(),
            ..HotelFilter::default()
        };
        assert_eq!(filter.sort_column(), "created_at");
    }

    #[test]
    fn test_sort_column_unknown_falls_back_to_name() {
        let filter = HotelFilter {
            sort_by: "password_hash".to_string(),
            ..HotelFilter::default()
        };
        assert_eq!(filter.sort_column(), "name");
    }

    #[test]
    fn test_features_round_trip() {
        let features = vec!["wifi".to_string(), "pool".to_string()];
        let column = Hotel::join_features(&features);
        assert_eq!(column, "wifi,pool");
        assert_eq!(Hotel::split_features(&column), features);
    }

    #[test]
    fn test_split_features_empty_column() {
        assert!(Hotel::split_features("").is_empty());
    }
}
