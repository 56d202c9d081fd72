use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String, pub service: String, pub version: String }

#[derive(ToSchema)]
pub struct InventoryInputDoc {
    pub name: String,
    /// produce, dairy, meat, seafood, bakery, grains, frozen, beverages, snacks, condiments, other
    pub category: Option<String>,
    pub quantity: f64,
    pub unit: Option<String>,
    pub location: Option<String>,
    pub expiry_date: Option<String>,
    pub purchase_date: Option<String>,
    pub price: Option<f64>,
    pub barcode: Option<String>,
}

#[derive(ToSchema)]
pub struct ConsumeRequestDoc { pub amount: f64 }

#[derive(ToSchema)]
pub struct ShoppingInputDoc {
    pub name: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub category: Option<String>,
    /// low, normal or high
    pub priority: Option<String>,
    pub note: Option<String>,
}

#[derive(ToSchema)]
pub struct MealPlanInputDoc {
    pub date: String,
    pub meal_type: String,
    pub title: Option<String>,
    pub recipe_id: Option<String>,
    pub servings: u32,
    pub notes: Option<String>,
}

#[derive(ToSchema)]
pub struct ConsumptionInputDoc {
    pub member: String,
    pub item_name: Option<String>,
    pub inventory_id: Option<Uuid>,
    pub quantity: f64,
    pub unit: Option<String>,
    pub meal_type: Option<String>,
    pub calories: Option<f64>,
}

#[derive(ToSchema)]
pub struct TextRequestDoc { pub text: String }

#[derive(ToSchema)]
pub struct CalculateRequestDoc { pub food_name: String, pub weight_g: f64, pub precise: bool }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::metrics_text,
        crate::routes::inventory::list,
        crate::routes::inventory::create,
        crate::routes::inventory::get_item,
        crate::routes::inventory::update,
        crate::routes::inventory::delete,
        crate::routes::inventory::consume,
        crate::routes::inventory::expiring,
        crate::routes::recipes::list,
        crate::routes::recipes::get_recipe,
        crate::routes::recipes::matches,
        crate::routes::recipes::add_missing,
        crate::routes::shopping::list,
        crate::routes::shopping::add,
        crate::routes::shopping::update,
        crate::routes::shopping::delete,
        crate::routes::shopping::toggle,
        crate::routes::shopping::clear_purchased,
        crate::routes::shopping::checkout,
        crate::routes::shopping_ai::predict,
        crate::routes::shopping_ai::patterns,
        crate::routes::shopping_ai::insights,
        crate::routes::shopping_ai::feedback,
        crate::routes::shopping_ai::apply,
        crate::routes::shopping_ai::smart_prioritize,
        crate::routes::shopping_ai::categories,
        crate::routes::shopping_ai::seasonal,
        crate::routes::meal_plans::list,
        crate::routes::meal_plans::create,
        crate::routes::meal_plans::week,
        crate::routes::meal_plans::update,
        crate::routes::meal_plans::delete,
        crate::routes::consumption::list,
        crate::routes::consumption::log,
        crate::routes::consumption::summary,
        crate::routes::consumption::remove,
        crate::routes::ocr::scan_receipt,
        crate::routes::ocr::scan_item,
        crate::routes::ocr::parse,
        crate::routes::ocr::sample,
        crate::routes::ocr::import,
        crate::routes::barcode::lookup,
        crate::routes::barcode::add,
        crate::routes::nutrition::calculate,
        crate::routes::nutrition::portion,
        crate::routes::nutrition::meal,
        crate::routes::nutrition::foods,
        crate::routes::meal_ai::set_preferences,
        crate::routes::meal_ai::preferences,
        crate::routes::meal_ai::record,
        crate::routes::meal_ai::batch_learn,
        crate::routes::meal_ai::suggestions,
        crate::routes::meal_ai::generate,
        crate::routes::meal_ai::optimize_waste,
        crate::routes::meal_ai::rate,
        crate::routes::meal_ai::insights,
        crate::routes::summary::suggestions,
        crate::routes::summary::dashboard,
    ),
    components(
        schemas(
            HealthResponse,
            InventoryInputDoc,
            ConsumeRequestDoc,
            ShoppingInputDoc,
            MealPlanInputDoc,
            ConsumptionInputDoc,
            TextRequestDoc,
            CalculateRequestDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "inventory"),
        (name = "recipes"),
        (name = "shopping"),
        (name = "shopping-ai"),
        (name = "meal-plans"),
        (name = "consumption"),
        (name = "ocr"),
        (name = "barcode"),
        (name = "nutrition"),
        (name = "meal-ai"),
        (name = "dashboard"),
    )
)]
pub struct ApiDoc;
