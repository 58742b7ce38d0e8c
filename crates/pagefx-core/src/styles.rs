#![forbid(unsafe_code)]

//! Stylesheet appended to `<head>` at init.
//!
//! Holds the keyframes and classes the effects rely on: ripple, rainbow,
//! fade-in, form errors and lazy-image blur.

pub const INJECTED_CSS: &str = r"
.ripple {
    position: absolute;
    border-radius: 50%;
    background: rgba(255, 255, 255, 0.3);
    transform: scale(0);
    animation: rippleEffect 0.6s linear;
    pointer-events: none;
}

@keyframes rippleEffect {
    to {
        transform: scale(4);
        opacity: 0;
    }
}

@keyframes rainbow {
    0% { filter: hue-rotate(0deg); }
    100% { filter: hue-rotate(360deg); }
}

.animate-in {
    animation: fadeInUp 0.8s ease-out forwards;
}

@keyframes fadeInUp {
    from {
        opacity: 0;
        transform: translateY(30px);
    }
    to {
        opacity: 1;
        transform: translateY(0);
    }
}

.error {
    border-color: #FF5454 !important;
    background-color: rgba(255, 84, 84, 0.1) !important;
}

.lazy {
    filter: blur(5px);
    transition: filter 0.3s;
}

img {
    transition: filter 0.3s ease;
}
";
