use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{Hotel, HotelFilter, Location};

/// hotels テーブルの1行（features はカンマ区切りの生カラム）
///
/// カラム順は固定: id, name, description, city, country, image_url,
/// price_per_night, rating, phone_number, features, created_at
#[derive(Debug, FromRow)]
struct HotelRow {
    id: Uuid,
    name: String,
    description: String,
    city: String,
    country: String,
    image_url: String,
    price_per_night: f64,
    rating: f64,
    phone_number: String,
    features: String,
    created_at: OffsetDateTime,
}

impl From<HotelRow> for Hotel {
    fn from(row: HotelRow) -> Self {
        Hotel {
            id: row.id,
            name: row.name,
            description: row.description,
            location: Location {
                city: row.city,
                country: row.country,
            },
            image_url: row.image_url,
            price_per_night: row.price_per_night,
            rating: row.rating,
            phone_number: row.phone_number,
            features: Hotel::split_features(&row.features),
            created_at: row.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, description, city, country, image_url, \
     price_per_night, rating, phone_number, features, created_at FROM hotels";

/// フィルターからパラメータ化クエリを構築する
///
/// 条件は固定順で AND 結合: city → country → name（search）→
/// 価格レンジ → 最低評価 → 設備タグ。
/// ユーザー入力値はすべて push_bind で渡し、SQL文字列には埋め込まない。
/// ORDER BY の識別子のみ許可リスト済みの値をそのまま連結する
/// （sort_column / sort_order は validate() で正規化済みであること）。
fn build_search_query(
    filter: &HotelFilter,
    features: &[String],
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(SELECT_COLUMNS);
    query.push(" WHERE 1=1");

    if let Some(city) = &filter.city {
        query.push(" AND city ILIKE ");
        query.push_bind(format!("%{}%", city));
    }

    if let Some(country) = &filter.country {
        query.push(" AND country ILIKE ");
        query.push_bind(format!("%{}%", country));
    }

    if let Some(search) = &filter.search {
        query.push(" AND name ILIKE ");
        query.push_bind(format!("%{}%", search));
    }

    query.push(" AND price_per_night BETWEEN ");
    query.push_bind(filter.min_price);
    query.push(" AND ");
    query.push_bind(filter.max_price);

    query.push(" AND rating >= ");
    query.push_bind(filter.min_rating);

    for feature in features {
        query.push(" AND features ILIKE ");
        query.push_bind(format!("%{}%", feature));
    }

    query.push(format!(
        " ORDER BY {} {}",
        filter.sort_column(),
        filter.sort_order
    ));

    query.push(" LIMIT ");
    query.push_bind(filter.page_size);
    query.push(" OFFSET ");
    query.push_bind(filter.offset());

    query
}

#[derive(Clone)]
pub struct HotelRepository {
    pool: PgPool,
}

impl HotelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// フィルター条件に合致するホテルを検索
    ///
    /// filter は validate() 済み、features は normalize 済みであること
    pub async fn search(
        &self,
        filter: &HotelFilter,
        features: &[String],
    ) -> Result<Vec<Hotel>, sqlx::Error> {
        let rows = build_search_query(filter, features)
            .build_query_as::<HotelRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Hotel::from).collect())
    }

    /// IDでホテルを検索
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Hotel>, sqlx::Error> {
        let row = sqlx::query_as::<_, HotelRow>(
            r#"
            SELECT id, name, description, city, country, image_url,
                   price_per_night, rating, phone_number, features, created_at
            FROM hotels
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Hotel::from))
    }

    /// 新しいホテルを作成
    ///
    /// features は書き込み時にカンマ区切りへ結合する
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        city: &str,
        country: &str,
        image_url: &str,
        price_per_night: f64,
        rating: f64,
        phone_number: &str,
        features: &[String],
    ) -> Result<Hotel, sqlx::Error> {
        let row = sqlx::query_as::<_, HotelRow>(
            r#"
            INSERT INTO hotels (name, description, city, country, image_url,
                                price_per_night, rating, phone_number, features)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, name, description, city, country, image_url,
                      price_per_night, rating, phone_number, features, created_at
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(city)
        .bind(country)
        .bind(image_url)
        .bind(price_per_night)
        .bind(rating)
        .bind(phone_number)
        .bind(Hotel::join_features(features))
        .fetch_one(&self.pool)
        .await?;

        Ok(Hotel::from(row))
    }
}
