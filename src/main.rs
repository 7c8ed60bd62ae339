use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rental_scout::api::{
    AuthApi, BearerToken, BookingsApi, FavoritesApi, ForgotPassword, HttpApiClient, ListingsApi,
    Registration,
};
use rental_scout::config::Config;
use rental_scout::favorites::{Change, FavoriteOverlay};
use rental_scout::feed::{ListingFeed, ListingQuery};
use rental_scout::models::{ListingId, NewBooking, NewReview, Role, StatusUpdate};
use rental_scout::notify::{self, Level, Notifications};
use rental_scout::pipeline::{
    validate_min_rating, FilterCriteria, ListingBrowser, PriceRange, SortMode,
};
use rental_scout::render;
use rental_scout::session::{AuthSession, SessionStore};
use rental_scout::ApiError;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Browse rental listings, manage favorites and bookings.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Browse listings with client-side filters
    Listings {
        /// Free-text location sent to the search endpoint
        #[arg(short, long)]
        location: Option<String>,
        /// Show the featured listings instead of the full list
        #[arg(long)]
        featured: bool,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Search listings by street, city, state or pincode
    Search {
        location: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Show one listing with its reviews
    Show { id: u64 },
    /// Review a listing after a completed visit
    Review {
        id: u64,
        /// 1 to 5 stars
        #[arg(short, long)]
        rating: u8,
        #[arg(short, long)]
        comment: Option<String>,
    },
    /// Create an account; a verification link is emailed
    Register {
        username: String,
        email: String,
        mobile_no: String,
        #[arg(long)]
        password: String,
        /// user or owner
        #[arg(long, default_value = "user")]
        role: Role,
    },
    /// Sign in and remember the session
    Login { username: String, password: String },
    /// Forget the stored session
    Logout,
    /// Get a new access token with the stored refresh token
    Refresh,
    /// Email a password reset link
    ForgotPassword { email: String },
    /// Set a new password from a reset link token
    ResetPassword { token: String, new_password: String },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoriteAction,
    },
    /// Booking requests
    Bookings {
        #[command(subcommand)]
        action: BookingAction,
    },
    /// Owner dashboard: totals, listings and incoming bookings
    Dashboard,
}

/// Filters, sort and page for list views
#[derive(Debug, Args)]
struct ViewArgs {
    /// Match title or address locally
    #[arg(short, long)]
    keyword: Option<String>,
    #[arg(long, default_value_t = 0.0)]
    min_rent: f64,
    #[arg(long, default_value_t = 50_000.0)]
    max_rent: f64,
    #[arg(long, default_value_t = 0.0)]
    min_rating: f64,
    /// default, price_asc, price_desc, rating_asc or rating_desc
    #[arg(short, long, default_value = "default")]
    sort: SortMode,
    #[arg(short, long, default_value_t = 1)]
    page: usize,
}

impl ViewArgs {
    fn criteria(&self) -> rental_scout::Result<FilterCriteria> {
        Ok(FilterCriteria {
            price_range: PriceRange::new(self.min_rent, self.max_rent)?,
            min_rating: validate_min_rating(self.min_rating)?,
            sort: self.sort,
            keyword: self.keyword.clone(),
        })
    }
}

#[derive(Debug, Subcommand)]
enum FavoriteAction {
    List,
    Add { id: u64 },
    Remove { id: u64 },
    Toggle { id: u64 },
}

#[derive(Debug, Subcommand)]
enum BookingAction {
    /// Bookings you made
    My,
    /// Bookings on your listings (owners)
    Owner,
    Create {
        listing_id: u64,
        #[arg(short, long, default_value_t = 1)]
        attendees: u32,
    },
    /// confirmed, cancelled or left
    Status { id: u64, status: StatusUpdate },
    Cancel { id: u64 },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let token = BearerToken::default();
    let client = Arc::new(
        HttpApiClient::new(&config, token.clone()).context("Failed to create HTTP client")?,
    );
    let mut session = AuthSession::hydrate(SessionStore::new(&config.state_file), token.clone())
        .await
        .context("Failed to restore session")?;
    let (notifier, mut notifications) = notify::channel();
    let favorites = FavoriteOverlay::new(client.clone(), token, notifier.clone());

    info!("🏠 Rental Scout - {}", config.api_base_url);

    // The favorites overlay reports its own failures
    let self_reporting = matches!(cli.command, Command::Favorites { .. });

    let outcome = run(cli.command, client, &mut session, &favorites).await;

    if let Err(err) = &outcome {
        if !self_reporting {
            notifier.error(err.user_message());
        }
    }
    print_notifications(&mut notifications);

    Ok(ExitCode::from(exit_status(&outcome)))
}

/// 0 on success; 1 once the failure has been shown to the viewer
fn exit_status(outcome: &rental_scout::Result<()>) -> u8 {
    match outcome {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

async fn run(
    command: Command,
    client: Arc<HttpApiClient>,
    session: &mut AuthSession,
    favorites: &FavoriteOverlay<HttpApiClient>,
) -> rental_scout::Result<()> {
    match command {
        Command::Listings {
            location,
            featured,
            view,
        } => {
            let query = ListingQuery::location(location.unwrap_or_default());
            show_hearts(session, favorites).await;
            browse(client, favorites, query, &view, featured).await
        }
        Command::Search { location, view } => {
            show_hearts(session, favorites).await;
            browse(client, favorites, ListingQuery::location(location), &view, false).await
        }
        Command::Show { id } => {
            let listing = client.listing(ListingId(id)).await?;
            show_hearts(session, favorites).await;
            println!(
                "{}",
                render::listing_detail(&listing, favorites.is_favorite(listing.id))
            );
            Ok(())
        }
        Command::Review {
            id,
            rating,
            comment,
        } => {
            if !session.is_authenticated() {
                return Err(ApiError::AuthenticationRequired);
            }
            let review = NewReview::new(rating, comment)?;
            let saved = client.submit_review(ListingId(id), &review).await?;
            println!("Review submitted: {}★ for listing {}", saved.rating, id);
            Ok(())
        }
        Command::Register {
            username,
            email,
            mobile_no,
            password,
            role,
        } => {
            let registration = Registration::new(&username, &email, &password, &mobile_no, role)?;
            println!("{}", client.register(&registration).await?);
            Ok(())
        }
        Command::Login { username, password } => {
            let user = session
                .login(client.as_ref(), &username, &password)
                .await?;
            println!("Logged in as {} ({})", user.username, user.role);
            Ok(())
        }
        Command::Logout => {
            session.logout().await?;
            favorites.clear();
            println!("Logged out");
            Ok(())
        }
        Command::Refresh => {
            session.refresh(client.as_ref()).await?;
            println!("Session refreshed");
            Ok(())
        }
        Command::ForgotPassword { email } => {
            let request = ForgotPassword::new(&email)?;
            println!("{}", client.forgot_password(&request).await?);
            Ok(())
        }
        Command::ResetPassword {
            token,
            new_password,
        } => {
            println!("{}", client.reset_password(&token, &new_password).await?);
            Ok(())
        }
        Command::Favorites { action } => manage_favorites(favorites, action).await,
        Command::Bookings { action } => {
            if !session.is_authenticated() {
                return Err(ApiError::AuthenticationRequired);
            }
            manage_bookings(client.as_ref(), session.role(), action).await
        }
        Command::Dashboard => {
            if !session.is_authenticated() {
                return Err(ApiError::AuthenticationRequired);
            }
            require_owner(session.role())?;
            let dashboard = client.owner_dashboard().await?;
            println!("{}", render::owner_dashboard(&dashboard));
            Ok(())
        }
    }
}

/// Hearts are decoration; a failed load is reported by the overlay and
/// the view renders without them.
async fn show_hearts(session: &AuthSession, favorites: &FavoriteOverlay<HttpApiClient>) {
    if session.is_authenticated() {
        let _ = favorites.hydrate().await;
    }
}

async fn browse(
    client: Arc<HttpApiClient>,
    favorites: &FavoriteOverlay<HttpApiClient>,
    query: ListingQuery,
    view: &ViewArgs,
    featured: bool,
) -> rental_scout::Result<()> {
    let criteria = view.criteria()?;
    let feed = ListingFeed::new(client);
    let Some(snapshot) = feed.update(query).await? else {
        return Ok(());
    };

    if featured {
        println!("⭐ Featured Properties ({})\n", snapshot.featured.len());
        for (i, listing) in snapshot.featured.iter().enumerate() {
            let favorite = favorites.is_favorite(listing.id);
            println!("{}", render::listing_card(i + 1, listing, favorite));
        }
        return Ok(());
    }

    let mut browser = ListingBrowser::with_criteria(snapshot.listings, criteria);
    browser.go_to(view.page);

    let badges = render::active_filters(browser.criteria());
    if !badges.is_empty() {
        println!("Active filters: {}\n", badges.join(" | "));
    }

    let page = browser.page();
    let offset = page.first_position();
    for (i, listing) in page.items.iter().enumerate() {
        let favorite = favorites.is_favorite(listing.id);
        println!("{}", render::listing_card(offset + i, listing, favorite));
    }
    println!("{}", render::page_footer(&page));
    println!(
        "{} of {} properties match",
        browser.filtered_count(),
        browser.total_count()
    );
    Ok(())
}

async fn manage_favorites<A: FavoritesApi>(
    favorites: &FavoriteOverlay<A>,
    action: FavoriteAction,
) -> rental_scout::Result<()> {
    let (id, change) = match action {
        FavoriteAction::List => {
            let saved = favorites.load().await?;
            if saved.is_empty() {
                println!("No favorites yet");
            }
            for (i, favorite) in saved.iter().enumerate() {
                println!("{}", render::favorite_line(i + 1, favorite));
            }
            return Ok(());
        }
        FavoriteAction::Add { id } => {
            favorites.hydrate().await?;
            (id, favorites.add(ListingId(id)).await?)
        }
        FavoriteAction::Remove { id } => {
            favorites.hydrate().await?;
            (id, favorites.remove(ListingId(id)).await?)
        }
        FavoriteAction::Toggle { id } => {
            favorites.hydrate().await?;
            (id, favorites.toggle(ListingId(id)).await?)
        }
    };

    if change == Change::Unchanged {
        println!("Listing {} was already in the requested state", id);
    }
    Ok(())
}

fn require_owner(role: Option<Role>) -> rental_scout::Result<()> {
    if role == Some(Role::Owner) {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "only owners have a bookings dashboard".to_string(),
        ))
    }
}

async fn manage_bookings<A: BookingsApi>(
    client: &A,
    role: Option<Role>,
    action: BookingAction,
) -> rental_scout::Result<()> {
    match action {
        BookingAction::My => {
            let bookings = client.my_bookings().await?;
            if bookings.is_empty() {
                println!("No bookings yet");
            }
            for booking in &bookings {
                println!("{}", render::booking_line(booking));
            }
        }
        BookingAction::Owner => {
            require_owner(role)?;
            for booking in &client.owner_bookings().await? {
                println!("{}", render::booking_line(booking));
            }
        }
        BookingAction::Create {
            listing_id,
            attendees,
        } => {
            let request = NewBooking::new(ListingId(listing_id), attendees)?;
            let booking = client.create_booking(&request).await?;
            println!("Booking scheduled: {}", render::booking_line(&booking));
        }
        BookingAction::Status { id, status } => {
            let booking = client.update_booking_status(id, status).await?;
            println!("Booking updated: {}", render::booking_line(&booking));
        }
        BookingAction::Cancel { id } => {
            client.cancel_booking(id).await?;
            println!("Booking {} cancelled", id);
        }
    }
    Ok(())
}

fn print_notifications(notifications: &mut Notifications) {
    for notification in notify::drain(notifications) {
        let marker = match notification.level {
            Level::Info => "ℹ️ ",
            Level::Success => "✅",
            Level::Error => "❌",
        };
        eprintln!("{} {}", marker, notification.message);
    }
}
