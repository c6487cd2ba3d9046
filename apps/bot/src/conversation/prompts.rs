// Fixed bot replies for the conversation flow.

pub const WELCOME: &str =
    "👋 Hi! I'm your CV generation bot. Use /generate_cv to start creating your CV!";

pub const HELP: &str = "Here are the available commands:\n\
/start - Start the bot\n\
/help - Show this help message\n\
/generate_cv - Start CV generation process";

pub const ASK_NAME: &str = "Let's create your CV! First, what's your full name?";
pub const ASK_EXPERIENCE: &str = "Great! Now, please describe your work experience:";
pub const ASK_EDUCATION: &str = "Perfect! What's your education background?";
pub const ASK_TECH_STACK: &str = "Almost done! List your technical skills (comma-separated):";
