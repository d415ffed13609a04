//! `storefront`: command-line shell over the cart store.
//!
//! Every invocation opens the configured storage slot, applies one operation
//! and prints the resulting cart (or order confirmation) as JSON on stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use storefront_cart::LineItemId;
use storefront_catalog::{CatalogProduct, DEFAULT_COLOR, DEFAULT_SIZE};
use storefront_client::{CartStore, Checkout};
use storefront_core::ProductId;
use storefront_infra::{StorefrontConfig, WooCommerceRelay, open_slot};
use storefront_orders::{CustomerContact, PaymentConfirmation};

/// Headless storefront cart
#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(about = "Manage the local storefront cart and place orders")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Identifies one cart line.
#[derive(clap::Args, Debug)]
struct LineArgs {
    /// Catalog product id
    #[arg(long)]
    product_id: u64,

    /// Variant color
    #[arg(long, default_value = DEFAULT_COLOR)]
    color: String,

    /// Variant size
    #[arg(long, default_value = DEFAULT_SIZE)]
    size: String,
}

impl LineArgs {
    fn line_item_id(&self) -> LineItemId {
        LineItemId::new(ProductId::new(self.product_id), &self.color, &self.size)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add one unit of a product (catalog JSON record) to the cart
    Add {
        /// Path to the product JSON as returned by the catalog API
        #[arg(long)]
        product: PathBuf,

        /// Variant name, used as the line color
        #[arg(long)]
        variant: Option<String>,

        /// Chosen size
        #[arg(long)]
        size: Option<String>,

        /// Image to show for this line (defaults to the first product image)
        #[arg(long)]
        image: Option<String>,
    },

    /// Remove a line from the cart
    Remove(LineArgs),

    /// Set the quantity of a line (values below 1 are ignored)
    SetQuantity {
        #[command(flatten)]
        line: LineArgs,

        /// New quantity
        #[arg(long, allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Empty the cart
    Clear,

    /// Print the cart with totals
    Show,

    /// Create the order for a paid cart, then clear the cart
    Checkout {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        phone: String,

        /// Payment provider confirmation reference
        #[arg(long)]
        payment_ref: String,
    },
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to render JSON output")?;
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    storefront_observability::init();

    let config = StorefrontConfig::from_env().context("invalid storefront configuration")?;
    let slot = open_slot(&config).context("failed to open cart storage")?;
    let store = CartStore::open(slot);

    match args.command {
        Command::Add {
            product,
            variant,
            size,
            image,
        } => {
            let raw = std::fs::read_to_string(&product)
                .with_context(|| format!("failed to read product file {product:?}"))?;
            let product: CatalogProduct =
                serde_json::from_str(&raw).context("failed to parse product JSON")?;
            let selection = product
                .select(variant.as_deref(), size.as_deref(), image.as_deref())
                .context("cannot add product to cart")?;
            store.add_item(selection);
        }
        Command::Remove(line) => store.remove_item(&line.line_item_id()),
        Command::SetQuantity { line, quantity } => {
            store.set_quantity(&line.line_item_id(), quantity)
        }
        Command::Clear => store.clear(),
        Command::Show => {}
        Command::Checkout {
            first_name,
            last_name,
            email,
            phone,
            payment_ref,
        } => {
            let relay = WooCommerceRelay::from_settings(&config.woocommerce)
                .context("order relay is not available")?;
            let checkout = Checkout::new(relay, config.currency.clone());
            let customer = CustomerContact::new(first_name, last_name, email, phone);

            return match checkout
                .complete(&store, customer, PaymentConfirmation::paypal(payment_ref))
                .await
            {
                Ok(confirmation) => print_json(&confirmation),
                Err(err) => {
                    eprintln!("{}", err.user_message());
                    Err(anyhow::Error::new(err).context("checkout failed"))
                }
            };
        }
    }

    print_json(&store.snapshot())
}
