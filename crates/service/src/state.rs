use std::sync::Arc;

use configs::AppConfig;

use crate::barcode::BarcodeService;
use crate::consumption::ConsumptionService;
use crate::dashboard::DashboardService;
use crate::errors::ServiceError;
use crate::inventory::InventoryService;
use crate::meal_ai::MealAiService;
use crate::meal_plans::MealPlanService;
use crate::nutrition::NutritionService;
use crate::ocr::{HttpOcrEngine, OcrEngine, OcrService};
use crate::recipes::RecipeService;
use crate::shopping::ShoppingService;
use crate::shopping_ai::ShoppingAiService;
use crate::suggestions::SuggestionService;

/// Every domain service, sharing one set of in-memory stores.
#[derive(Clone)]
pub struct AppServices {
    pub inventory: Arc<InventoryService>,
    pub shopping: Arc<ShoppingService>,
    pub recipes: RecipeService,
    pub meal_plans: MealPlanService,
    pub consumption: ConsumptionService,
    pub nutrition: NutritionService,
    pub ocr: OcrService,
    pub barcode: BarcodeService,
    pub meal_ai: MealAiService,
    pub shopping_ai: ShoppingAiService,
    pub suggestions: SuggestionService,
    pub dashboard: DashboardService,
}

impl AppServices {
    pub fn new(cfg: &AppConfig) -> Result<Self, ServiceError> {
        let engine = Arc::new(HttpOcrEngine::new(&cfg.ocr)?);
        Self::with_ocr_engine(cfg, engine)
    }

    /// Same wiring with a caller-supplied OCR backend.
    pub fn with_ocr_engine(cfg: &AppConfig, engine: Arc<dyn OcrEngine>) -> Result<Self, ServiceError> {
        let inventory = Arc::new(InventoryService::new());
        let shopping = Arc::new(ShoppingService::new(inventory.clone()));
        let recipes = RecipeService::new(inventory.clone(), shopping.clone());
        let meal_plans = MealPlanService::new(recipes.clone());
        let nutrition = NutritionService::new();
        let consumption = ConsumptionService::new(inventory.clone(), nutrition);
        Ok(Self {
            ocr: OcrService::new(engine, inventory.clone()),
            barcode: BarcodeService::from_config(&cfg.barcode, inventory.clone())?,
            meal_ai: MealAiService::new(recipes.clone()),
            shopping_ai: ShoppingAiService::new(inventory.clone(), shopping.clone()),
            suggestions: SuggestionService::new(inventory.clone(), recipes.clone()),
            dashboard: DashboardService::new(inventory.clone(), shopping.clone(), meal_plans.clone(), consumption.clone()),
            inventory,
            shopping,
            recipes,
            meal_plans,
            consumption,
            nutrition,
        })
    }
}
