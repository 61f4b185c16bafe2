//! Command-line surface for the LocalStore storefront engine. Thin glue:
//! every command parses arguments, calls into the stores, and prints the
//! resulting snapshots.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use localstore_client::api::{Location, ManagerDetails, RegisterInput};
use localstore_client::config::{self, load_config};
use localstore_client::models::{ManagerAction, Order, OrderStatus, Role};
use localstore_client::StorefrontState;

#[derive(Parser)]
#[command(name = "localstore", about = "LocalStore storefront client", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, register, or end the session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Browse the catalog
    Products {
        /// Only show one category
        #[arg(long)]
        category: Option<String>,
    },
    /// Inspect and mutate the cart
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },
    /// Check delivery coverage and place the order
    Checkout {
        #[command(subcommand)]
        command: CheckoutCommands,
    },
    /// Order feeds and status updates
    Orders {
        #[command(subcommand)]
        command: OrderCommands,
    },
    /// Poll the signed-in role's order feed until interrupted
    Watch,
}

#[derive(Subcommand)]
enum AuthCommands {
    Login {
        email: String,
        password: String,
        #[arg(long, value_enum, default_value_t = CliRole::Customer)]
        role: CliRole,
    },
    Register {
        name: String,
        email: String,
        password: String,
        #[arg(long, value_enum, default_value_t = CliRole::Customer)]
        role: CliRole,
        #[arg(long, default_value = "")]
        address: String,
        /// Outlet name, required when registering a manager
        #[arg(long)]
        outlet: Option<String>,
    },
    Logout,
    Whoami,
}

#[derive(Subcommand)]
enum CartCommands {
    Show,
    Add { product_id: Uuid },
    Remove { product_id: Uuid },
    Set { product_id: Uuid, quantity: u32 },
    Clear,
}

#[derive(Subcommand)]
enum CheckoutCommands {
    /// Validate a postcode and check delivery coverage
    Check { postcode: String },
    /// Submit the cart as a delivery order
    Place { postcode: String },
}

#[derive(Subcommand)]
enum OrderCommands {
    Mine,
    Manager,
    Delivery,
    /// Manager triage actions
    Accept { order_id: Uuid },
    Reject { order_id: Uuid },
    Ready { order_id: Uuid },
    Assign { order_id: Uuid },
    /// Delivery partner status update
    Status {
        order_id: Uuid,
        #[arg(value_enum)]
        status: CliDeliveryStatus,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CliRole {
    Customer,
    Manager,
    Delivery,
}

impl From<CliRole> for Role {
    fn from(role: CliRole) -> Self {
        match role {
            CliRole::Customer => Role::Customer,
            CliRole::Manager => Role::Manager,
            CliRole::Delivery => Role::Delivery,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliDeliveryStatus {
    Accepted,
    OutForDelivery,
    Delivered,
}

impl From<CliDeliveryStatus> for OrderStatus {
    fn from(status: CliDeliveryStatus) -> Self {
        match status {
            CliDeliveryStatus::Accepted => OrderStatus::Accepted,
            CliDeliveryStatus::OutForDelivery => OrderStatus::OutForDelivery,
            CliDeliveryStatus::Delivered => OrderStatus::Delivered,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config().context("loading configuration")?;
    config::init_tracing(&cfg.log_level, cfg.log_json);

    let state = StorefrontState::new(cfg).map_err(|e| anyhow!(e.to_string()))?;
    if let Err(e) = state.bootstrap().await {
        eprintln!("warning: {}", e.user_message());
    }

    match cli.command {
        Commands::Auth { command } => handle_auth(&state, command).await,
        Commands::Products { category } => handle_products(&state, category),
        Commands::Cart { command } => handle_cart(&state, command),
        Commands::Checkout { command } => handle_checkout(&state, command).await,
        Commands::Orders { command } => handle_orders(&state, command).await,
        Commands::Watch => handle_watch(&state).await,
    }
}

async fn handle_auth(state: &StorefrontState, command: AuthCommands) -> Result<()> {
    match command {
        AuthCommands::Login {
            email,
            password,
            role,
        } => {
            let user = state
                .session
                .login(&email, &password, role.into())
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Signed in as {} ({})", user.name, user.role);
        }
        AuthCommands::Register {
            name,
            email,
            password,
            role,
            address,
            outlet,
        } => {
            let role: Role = role.into();
            if role == Role::Manager && outlet.is_none() {
                return Err(anyhow!("--outlet is required when registering a manager"));
            }
            let input = RegisterInput {
                name,
                email,
                password,
                role,
                address,
                location: Location::default(),
                manager: outlet.map(|name| ManagerDetails { name }),
            };
            let user = state
                .session
                .register(&input)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Registered {} ({})", user.email, user.role);
        }
        AuthCommands::Logout => {
            state.session.logout();
            println!("Signed out");
        }
        AuthCommands::Whoami => match state.session.current_user() {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role),
            None => println!("Not signed in"),
        },
    }
    Ok(())
}

fn handle_products(state: &StorefrontState, category: Option<String>) -> Result<()> {
    let products = match category {
        Some(category) => state.inventory.by_category(&category),
        None => state.inventory.all(),
    };
    if products.is_empty() {
        println!("No products");
        return Ok(());
    }
    for p in products {
        let badge = if p.stock == 0 {
            " [out of stock]"
        } else if p.is_low_stock() {
            " [low stock]"
        } else {
            ""
        };
        println!(
            "{}  {:<24} £{:<8} stock {:<4} {}{}",
            p.id, p.name, p.price, p.stock, p.category, badge
        );
    }
    Ok(())
}

fn handle_cart(state: &StorefrontState, command: CartCommands) -> Result<()> {
    match command {
        CartCommands::Show => print_cart(state),
        CartCommands::Add { product_id } => {
            state
                .cart
                .add_to_cart(product_id)
                .map_err(|e| anyhow!(e.user_message()))?;
            print_cart(state)
        }
        CartCommands::Remove { product_id } => {
            state
                .cart
                .remove_from_cart(product_id)
                .map_err(|e| anyhow!(e.user_message()))?;
            print_cart(state)
        }
        CartCommands::Set {
            product_id,
            quantity,
        } => {
            state
                .cart
                .update_quantity(product_id, quantity)
                .map_err(|e| anyhow!(e.user_message()))?;
            print_cart(state)
        }
        CartCommands::Clear => {
            state.cart.clear_cart();
            println!("Cart cleared");
            Ok(())
        }
    }
}

fn print_cart(state: &StorefrontState) -> Result<()> {
    let lines = state.cart.lines();
    if lines.is_empty() {
        println!("Your cart is empty");
        return Ok(());
    }
    for line in &lines {
        println!(
            "{}  {:<24} £{:<8} x{}",
            line.product_id, line.name, line.price, line.quantity
        );
    }
    let quote = state.checkout.quote();
    println!(
        "Subtotal £{} + delivery £{} = £{}",
        quote.subtotal, quote.delivery_fee, quote.total
    );
    Ok(())
}

async fn handle_checkout(state: &StorefrontState, command: CheckoutCommands) -> Result<()> {
    match command {
        CheckoutCommands::Check { postcode } => {
            let pc = state
                .checkout
                .check_delivery(&postcode)
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Delivery available to {pc}");
        }
        CheckoutCommands::Place { postcode } => {
            let tracked = state
                .checkout
                .place_order(&postcode)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!(
                "Order {} placed, £{}, estimated {} minutes",
                tracked
                    .order
                    .order_number
                    .as_deref()
                    .unwrap_or(&tracked.order.id.to_string()),
                tracked.order.total,
                tracked.estimated_delivery_time
            );
        }
    }
    Ok(())
}

async fn handle_orders(state: &StorefrontState, command: OrderCommands) -> Result<()> {
    match command {
        OrderCommands::Mine => {
            state.orders.refresh(Role::Customer).await.ok();
            print_orders(&state.orders.customer_orders())
        }
        OrderCommands::Manager => {
            state.orders.refresh(Role::Manager).await.ok();
            print_orders(&state.orders.manager_orders())
        }
        OrderCommands::Delivery => {
            state.orders.refresh(Role::Delivery).await.ok();
            print_orders(&state.orders.active_delivery_orders())
        }
        OrderCommands::Accept { order_id } => apply_action(state, order_id, ManagerAction::Accept).await,
        OrderCommands::Reject { order_id } => apply_action(state, order_id, ManagerAction::Reject).await,
        OrderCommands::Ready { order_id } => {
            apply_action(state, order_id, ManagerAction::MarkReady).await
        }
        OrderCommands::Assign { order_id } => {
            apply_action(state, order_id, ManagerAction::AssignDelivery).await
        }
        OrderCommands::Status { order_id, status } => {
            state
                .orders
                .set_delivery_status(order_id, status.into())
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Order {order_id} updated");
            Ok(())
        }
    }
}

async fn apply_action(
    state: &StorefrontState,
    order_id: Uuid,
    action: ManagerAction,
) -> Result<()> {
    let status = state
        .orders
        .apply_manager_action(order_id, action)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;
    println!("Order {order_id} -> {}", status.label());
    Ok(())
}

fn print_orders(orders: &[Order]) -> Result<()> {
    if orders.is_empty() {
        println!("No orders");
        return Ok(());
    }
    for order in orders {
        println!(
            "{}  {:<10} £{:<8} {}  {}",
            order.id,
            order.order_number.as_deref().unwrap_or("-"),
            order.total,
            order.status.label(),
            order.delivery_address
        );
    }
    Ok(())
}

async fn handle_watch(state: &StorefrontState) -> Result<()> {
    let poller = state
        .start_order_polling()
        .ok_or_else(|| anyhow!("sign in first"))?;
    println!("Watching {} orders; ctrl-c to stop", poller.role());

    let mut events = state.events.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => {
                if let Ok(event) = event {
                    println!("{}", serde_json::to_string(&event)?);
                }
            }
        }
    }
    Ok(())
}
